//! Addressed packet network supervised by a NAT.
//!
//! Every machine boots with its own address as first input and from then on
//! exchanges `(destination, x, y)` packets. A machine asking for input with
//! nothing queued is handed [`IDLE_INPUT`]. Packets for an address outside the
//! network are captured by the NAT, which keeps only the latest one.
//!
//! # Scheduling
//!
//! One round resumes each machine once, in address order, until it needs
//! input, emits a value or halts. Three emitted values form a packet, which is
//! routed straight onto the destination machine's inbound queue.
//!
//! After a round in which every live machine was idle (it last polled with
//! nothing queued, received nothing since and has no partial packet
//! buffered), the NAT delivers its packet to address 0 and lets go of it;
//! it only delivers again once some machine has sent it a new packet. The
//! network stops when the NAT delivers the same `y` twice in a row.

use crate::network::{NetworkConfig, NetworkError};
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Interrupt, InterruptSet, Machine};
use crate::{debug, info, warn};
use std::fmt;

/// Canonical address of the NAT.
pub const NAT_ADDRESS: i64 = 255;

/// Number of machines in the canonical network.
pub const DEFAULT_NAT_SIZE: usize = 50;

/// Value handed to a machine polling an empty inbound queue.
pub const IDLE_INPUT: i64 = -1;

/// One routed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Packet {
    pub destination: i64,
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-> {} ({}, {})", self.destination, self.x, self.y)
    }
}

/// Outcome of a settled network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NatReport {
    /// The first packet the NAT captured.
    pub first_packet: Packet,
    /// The `y` the NAT delivered to address 0 twice in a row.
    pub repeated_y: i64,
    /// Scheduling rounds it took to settle.
    pub rounds: u64,
}

#[derive(Debug)]
struct Node {
    machine: Machine,
    idle: bool,
}

impl Node {
    fn deliver(&mut self, packet: Packet) {
        self.machine.extend_input([packet.x, packet.y]);
        self.idle = false;
    }

    /// Pops a complete packet off the outbound queue, if one is buffered.
    fn take_packet(&mut self) -> Option<Packet> {
        if self.machine.channel().pending_output() < 3 {
            return None;
        }
        Some(Packet {
            destination: self.machine.pop_output()?,
            x: self.machine.pop_output()?,
            y: self.machine.pop_output()?,
        })
    }
}

/// A network of machines running the same program.
#[derive(Debug)]
pub struct Network {
    nodes: Vec<Node>,
    config: NetworkConfig,
    held: Option<Packet>,
    first_packet: Option<Packet>,
    last_delivered_y: Option<i64>,
    rounds: u64,
}

impl Network {
    /// Boots `size` machines, handing each its address.
    pub fn new(program: &Program, size: usize, config: NetworkConfig) -> Result<Self, NetworkError> {
        if size == 0 {
            return Err(NetworkError::InvalidTopology {
                reason: "network needs at least one machine".to_string(),
            });
        }
        if size as i64 > NAT_ADDRESS {
            return Err(NetworkError::InvalidTopology {
                reason: format!("{size} machines would shadow the NAT address {NAT_ADDRESS}"),
            });
        }
        let nodes = (0..size)
            .map(|address| Node {
                machine: Machine::with_input(program, [address as i64]),
                idle: false,
            })
            .collect();
        Ok(Self {
            nodes,
            config,
            held: None,
            first_packet: None,
            last_delivered_y: None,
            rounds: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Packet currently held by the NAT, if not yet delivered.
    pub fn held(&self) -> Option<Packet> {
        self.held
    }

    /// First packet the NAT ever captured.
    pub fn first_packet(&self) -> Option<Packet> {
        self.first_packet
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Whether every live machine is waiting on input with nothing to do.
    pub fn is_idle(&self) -> bool {
        self.nodes.iter().all(|node| {
            node.machine.is_halted() || (node.idle && !node.machine.channel().has_output())
        })
    }

    /// Runs rounds until the NAT delivers the same `y` twice in a row.
    pub fn run(&mut self) -> Result<NatReport, NetworkError> {
        loop {
            if let Some(limit) = self.config.round_limit {
                if self.rounds >= limit {
                    return Err(NetworkError::RoundLimitExceeded { limit });
                }
            }
            self.round()?;
            if self.nodes.iter().all(|node| node.machine.is_halted()) {
                return Err(NetworkError::AllHalted);
            }
            if let Some(packet) = self.wake_if_idle() {
                let repeated_y = packet.y;
                let first_packet = self.first_packet.unwrap_or(packet);
                info!(
                    "network settled after {} rounds: NAT repeated y = {repeated_y}",
                    self.rounds
                );
                return Ok(NatReport {
                    first_packet,
                    repeated_y,
                    rounds: self.rounds,
                });
            }
        }
    }

    /// Resumes every machine once and routes any packet it completes.
    pub fn round(&mut self) -> Result<(), NetworkError> {
        self.rounds += 1;
        for address in 0..self.nodes.len() {
            let node = &mut self.nodes[address];
            let interrupt = node
                .machine
                .resume_until(InterruptSet::ALL)
                .map_err(NetworkError::machine(address))?;
            match interrupt {
                Interrupt::NeedsInput => {
                    node.machine.push_input(IDLE_INPUT);
                    node.idle = true;
                }
                Interrupt::HasOutput => {
                    node.idle = false;
                    if let Some(packet) = node.take_packet() {
                        debug!("machine {address} sent packet {packet}");
                        self.route(packet);
                    }
                }
                Interrupt::Halted => {}
            }
        }
        Ok(())
    }

    fn route(&mut self, packet: Packet) {
        match usize::try_from(packet.destination) {
            Ok(index) if index < self.nodes.len() => self.nodes[index].deliver(packet),
            _ => {
                if packet.destination != NAT_ADDRESS {
                    warn!(
                        "packet for unknown address {} captured by the NAT",
                        packet.destination
                    );
                }
                self.first_packet.get_or_insert(packet);
                self.held = Some(packet);
            }
        }
    }

    /// Delivers the held packet to address 0 if the network is idle.
    ///
    /// Returns the delivered packet when its `y` repeats the previous delivery.
    fn wake_if_idle(&mut self) -> Option<Packet> {
        if !self.is_idle() {
            return None;
        }
        let packet = self.held.take()?;
        debug!("network idle, NAT delivers {packet} to address 0");
        self.nodes[0].deliver(packet);
        let repeated = self.last_delivered_y == Some(packet.y);
        self.last_delivered_y = Some(packet.y);
        repeated.then_some(packet)
    }
}

/// Boots a network of `size` machines and runs it until it settles.
pub fn run_network(
    program: &Program,
    size: usize,
    config: NetworkConfig,
) -> Result<NatReport, NetworkError> {
    Network::new(program, size, config)?.run()
}

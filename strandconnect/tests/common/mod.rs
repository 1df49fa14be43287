//! Scripted interfaces shared by the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use strandvirtual::{ConnectionSubmission, Interface, Socket};

/// How a [`ScriptedInterface`] resolves each connect attempt.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    /// Resolve with a stream before returning the submission.
    Immediate,
    /// Resolve with a stream from a helper thread after the delay.
    After(Duration),
    /// Return a valid submission that stays pending.
    Never,
    /// Return an invalid submission.
    Invalid,
}

pub struct ScriptedInterface {
    name: String,
    behaviour: Behaviour,
    /// Server-side halves of every stream handed out, in resolution order.
    peers: Arc<Mutex<Vec<Socket>>>,
    /// Keeps `Never` submissions alive.
    parked: Mutex<Vec<Arc<ConnectionSubmission>>>,
    connects: AtomicUsize,
}

impl ScriptedInterface {
    pub fn new(name: &str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behaviour,
            peers: Arc::new(Mutex::new(Vec::new())),
            parked: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn take_peers(&self) -> Vec<Socket> {
        std::mem::take(&mut *self.peers.lock())
    }
}

impl Interface for ScriptedInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> Arc<ConnectionSubmission> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Invalid => Arc::new(ConnectionSubmission::new(false)),
            Behaviour::Immediate => {
                let submission = Arc::new(ConnectionSubmission::new(true));
                let (client, server) = Socket::pair();
                self.peers.lock().push(server);
                submission.set_socket(Arc::new(client));
                submission
            }
            Behaviour::After(delay) => {
                let submission = Arc::new(ConnectionSubmission::new(true));
                let resolver = Arc::clone(&submission);
                let peers = Arc::clone(&self.peers);
                thread::spawn(move || {
                    thread::sleep(delay);
                    let (client, server) = Socket::pair();
                    peers.lock().push(server);
                    resolver.set_socket(Arc::new(client));
                });
                submission
            }
            Behaviour::Never => {
                let submission = Arc::new(ConnectionSubmission::new(true));
                self.parked.lock().push(Arc::clone(&submission));
                submission
            }
        }
    }

    fn connect_non_blocking(&self) -> Option<Arc<ConnectionSubmission>> {
        Some(self.connect())
    }
}

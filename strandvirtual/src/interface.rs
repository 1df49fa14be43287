//! Named virtual interfaces.
//!
//! An interface is a rendezvous point: clients submit connect attempts, one
//! bound listener accepts them. Interfaces are looked up by name through a
//! process-wide registry so independent components can meet without sharing a
//! handle up front.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Result, StrandVirtualError};
use crate::socket::Socket;
use crate::submission::ConnectionSubmission;

/// Client-side view of a virtual interface.
///
/// Implementations must be safe for concurrent connect attempts from many
/// threads.
pub trait Interface: Send + Sync {
    /// Interface name; also used as the host identifier by clients.
    fn name(&self) -> &str;

    /// Submit a connect attempt. May wait for internal locks, never for a
    /// listener: use the submission's accessors to wait for the stream.
    fn connect(&self) -> Arc<ConnectionSubmission>;

    /// Submit a connect attempt without waiting at all. Returns `None` if the
    /// attempt could not be submitted right now.
    fn connect_non_blocking(&self) -> Option<Arc<ConnectionSubmission>>;
}

struct InterfaceState {
    listening: bool,
    /// Valid submissions waiting for `accept`.
    backlog: VecDeque<Arc<ConnectionSubmission>>,
}

/// The in-process [`Interface`] implementation.
pub struct VirtualInterface {
    name: String,
    state: Mutex<InterfaceState>,
    /// Signalled when a submission joins the backlog.
    incoming: Condvar,
}

fn registry() -> &'static Mutex<HashMap<String, Weak<VirtualInterface>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, Weak<VirtualInterface>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

impl VirtualInterface {
    /// Create a standalone interface that is not visible in the registry.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(InterfaceState {
                listening: false,
                backlog: VecDeque::new(),
            }),
            incoming: Condvar::new(),
        })
    }

    /// Return the registered interface called `name`, creating it if no live
    /// instance exists. The registry holds weak references only.
    pub fn obtain_shared(name: &str) -> Arc<Self> {
        let mut interfaces = registry().lock();
        if let Some(existing) = interfaces.get(name).and_then(Weak::upgrade) {
            return existing;
        }
        interfaces.retain(|_, weak| weak.strong_count() > 0);
        let interface = Self::new(name);
        interfaces.insert(name.to_string(), Arc::downgrade(&interface));
        interface
    }

    /// Become the interface's only listener.
    ///
    /// The returned lock accepts connections; dropping it unbinds the
    /// interface and closes every submission still waiting.
    pub fn bind(self: &Arc<Self>) -> Result<ListenerLock> {
        let mut state = self.state.lock();
        if state.listening {
            return Err(StrandVirtualError::AlreadyBound(self.name.clone()));
        }
        state.listening = true;
        tracing::debug!(interface = %self.name, "listener bound");
        Ok(ListenerLock {
            interface: Arc::clone(self),
        })
    }

    /// Whether a listener currently holds the interface.
    pub fn is_bound(&self) -> bool {
        self.state.lock().listening
    }

    /// Number of submissions waiting to be accepted.
    ///
    /// Submissions closed by their client are dropped from the backlog first.
    pub fn pending_count(&self) -> usize {
        let mut state = self.state.lock();
        state.backlog.retain(|submission| submission.is_pending());
        state.backlog.len()
    }

    fn submit(&self, state: &mut InterfaceState) -> Arc<ConnectionSubmission> {
        if !state.listening {
            tracing::debug!(interface = %self.name, "connect refused: no listener");
            return Arc::new(ConnectionSubmission::new(false));
        }
        state.backlog.retain(|submission| submission.is_pending());
        let submission = Arc::new(ConnectionSubmission::new(true));
        state.backlog.push_back(Arc::clone(&submission));
        self.incoming.notify_one();
        submission
    }

    fn accept_until(&self, deadline: Option<Instant>) -> Option<Socket> {
        let mut state = self.state.lock();
        loop {
            while let Some(submission) = state.backlog.pop_front() {
                let (client, server) = Socket::pair();
                if submission.set_socket(Arc::new(client)) {
                    tracing::debug!(interface = %self.name, socket = server.id(), "connection accepted");
                    return Some(server);
                }
            }
            if !state.listening {
                return None;
            }
            match deadline {
                None => self.incoming.wait(&mut state),
                Some(deadline) => {
                    if self.incoming.wait_until(&mut state, deadline).timed_out()
                        && state.backlog.is_empty()
                    {
                        return None;
                    }
                }
            }
        }
    }

    fn unbind(&self) {
        let mut state = self.state.lock();
        state.listening = false;
        let dropped = state.backlog.len();
        for submission in state.backlog.drain(..) {
            submission.close();
        }
        self.incoming.notify_all();
        tracing::debug!(interface = %self.name, dropped, "listener unbound");
    }
}

impl Interface for VirtualInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> Arc<ConnectionSubmission> {
        let mut state = self.state.lock();
        self.submit(&mut state)
    }

    fn connect_non_blocking(&self) -> Option<Arc<ConnectionSubmission>> {
        let mut state = self.state.try_lock()?;
        Some(self.submit(&mut state))
    }
}

impl fmt::Debug for VirtualInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VirtualInterface")
            .field("name", &self.name)
            .field("listening", &state.listening)
            .field("backlog", &state.backlog.len())
            .finish()
    }
}

/// Exclusive listener on a [`VirtualInterface`].
pub struct ListenerLock {
    interface: Arc<VirtualInterface>,
}

impl ListenerLock {
    /// The interface this listener is bound to.
    pub fn interface(&self) -> &Arc<VirtualInterface> {
        &self.interface
    }

    /// Wait for the next connect attempt and return the server-side socket.
    pub fn accept(&self) -> Option<Socket> {
        self.interface.accept_until(None)
    }

    /// Like [`accept`](Self::accept), giving up after `timeout`.
    pub fn accept_timeout(&self, timeout: Duration) -> Option<Socket> {
        self.interface.accept_until(Some(Instant::now() + timeout))
    }

    /// Accept a connect attempt only if one is already waiting.
    pub fn accept_non_blocking(&self) -> Option<Socket> {
        self.interface.accept_until(Some(Instant::now()))
    }
}

impl Drop for ListenerLock {
    fn drop(&mut self) {
        self.interface.unbind();
    }
}

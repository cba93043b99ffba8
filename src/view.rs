//! The dashboard's view model.
//!
//! [`GraphView`] owns the currently displayed snapshot together with the
//! connectivity flag and the bookkeeping that keeps late responses off the
//! screen.  Every poll takes a [`PollTicket`] before it goes out; when the
//! response comes back it is applied only if its ticket is still the latest
//! one issued and refresh has not been stopped in the meantime.

use chrono::{DateTime, Local};

use crate::backend::BackendError;
use crate::layout::{CircularLayout, LayoutPosition, Viewport};
use crate::scene::{self, Bounds, Camera, ColorPolicy, Scene};
use crate::types::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Connected,
    Disconnected,
}

impl Connection {
    pub fn is_connected(self) -> bool {
        self == Connection::Connected
    }
}

/// What started a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The auto-refresh timer.  Refused while auto-refresh is stopped.
    Timer,
    /// A user action or the follow-up of one.  Always allowed.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    seq: u64,
    generation: u64,
}

impl PollTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Result of handing a poll response to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The snapshot replaced the scene.
    Rendered { nodes: usize, edges: usize },
    /// The poll failed; the previous scene stays and the view is disconnected.
    Failed(String),
    /// A newer poll was issued after this one.
    Stale,
    /// Auto-refresh was stopped after this poll was issued.
    Cancelled,
}

pub struct GraphView {
    snapshot: Option<Snapshot>,
    connection: Connection,
    last_update: Option<DateTime<Local>>,
    issued: u64,
    generation: u64,
    refreshing: bool,
    layout: CircularLayout,
    viewport: Viewport,
    policy: ColorPolicy,
    camera: Camera,
    positions: Vec<LayoutPosition>,
}

impl GraphView {
    pub fn new(viewport: Viewport, layout: CircularLayout, policy: ColorPolicy) -> Self {
        Self {
            snapshot: None,
            connection: Connection::Disconnected,
            last_update: None,
            issued: 0,
            generation: 0,
            refreshing: false,
            layout,
            viewport,
            policy,
            camera: Camera::default(),
            positions: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn set_connection(&mut self, connection: Connection) {
        self.connection = connection;
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn policy(&self) -> &ColorPolicy {
        &self.policy
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn start_refresh(&mut self) {
        self.refreshing = true;
    }

    /// Stops auto-refresh.  Every poll issued before this call is discarded
    /// when it returns.
    pub fn stop_refresh(&mut self) {
        self.refreshing = false;
        self.generation += 1;
    }

    /// Issues a ticket for a new poll, or `None` when a timer poll arrives
    /// after auto-refresh was stopped.
    pub fn begin_poll(&mut self, trigger: Trigger) -> Option<PollTicket> {
        if trigger == Trigger::Timer && !self.refreshing {
            return None;
        }
        self.issued += 1;
        Some(PollTicket {
            seq: self.issued,
            generation: self.generation,
        })
    }

    pub fn apply(
        &mut self,
        ticket: PollTicket,
        result: Result<Snapshot, BackendError>,
    ) -> Applied {
        if ticket.generation != self.generation {
            return Applied::Cancelled;
        }
        if ticket.seq != self.issued {
            return Applied::Stale;
        }

        match result {
            Ok(snapshot) => {
                let applied = Applied::Rendered {
                    nodes: snapshot.nodes.len(),
                    edges: snapshot.edges.len(),
                };
                self.positions = self.layout.arrange(&snapshot.nodes, self.viewport);
                self.snapshot = Some(snapshot);
                self.connection = Connection::Connected;
                self.last_update = Some(Local::now());
                applied
            }
            Err(e) => {
                self.connection = Connection::Disconnected;
                Applied::Failed(e.user_message())
            }
        }
    }

    pub fn positions(&self) -> &[LayoutPosition] {
        &self.positions
    }

    /// The current scene; empty before the first successful poll.
    pub fn scene(&self) -> Scene {
        match &self.snapshot {
            Some(snapshot) => scene::render(snapshot, &self.positions, &self.policy),
            None => scene::render(&Snapshot::default(), &[], &self.policy),
        }
    }

    pub fn bounds(&self, scene: &Scene) -> Bounds {
        self.camera.bounds(scene, self.viewport)
    }

    pub fn fit_view(&mut self) {
        self.camera = Camera::Fitted;
    }

    /// Back to the full viewport with a freshly computed layout.
    pub fn reset_layout(&mut self) {
        self.camera = Camera::Viewport;
        self.positions = match &self.snapshot {
            Some(snapshot) => self.layout.arrange(&snapshot.nodes, self.viewport),
            None => Vec::new(),
        };
    }
}

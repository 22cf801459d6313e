//! Asset readiness tracking
//!
//! Models load outside the frame loop. Loaders push `AssetEvent`s through an
//! `AssetSender`; the simulation drains its `AssetInbox` once per tick and
//! reacts to whatever became ready since the last frame.

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{info, warn};
use std::collections::{HashMap, HashSet};

/// Tire meshes looked up on car models
pub const TIRE_NAMES: [&str; 4] = ["front_l_tire", "front_r_tire", "back_l_tire", "back_r_tire"];

/// Tail-light fixtures looked up on the player's car
pub const TAIL_LIGHT_NAMES: [&str; 4] = ["taillight_r2", "taillight_l1", "taillight_l2", "taillight_r1"];

/// Number of interchangeable skyscraper models
pub const SKYSCRAPER_VARIANTS: usize = 3;

/// Logical names of the models the simulation asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    PlayerCar,
    NpcCar,
    Barrier,
    LightBarrier,
    StreetLight,
    Skyscrapers,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::PlayerCar,
        AssetKind::NpcCar,
        AssetKind::Barrier,
        AssetKind::LightBarrier,
        AssetKind::StreetLight,
        AssetKind::Skyscrapers,
    ];

    /// Model files backing this kind, relative to the asset root
    pub fn paths(self) -> &'static [&'static str] {
        match self {
            AssetKind::PlayerCar => &["models/prototype_car.glb"],
            AssetKind::NpcCar => &["models/npc_car.glb"],
            AssetKind::Barrier => &["models/road_barrier.glb"],
            AssetKind::LightBarrier => &["models/road_light_barrier.glb"],
            AssetKind::StreetLight => &["models/light_test.glb"],
            AssetKind::Skyscrapers => &[
                "models/SkyScraperM1.glb",
                "models/SkyScraperM2.glb",
                "models/SkyScraperM3.glb",
            ],
        }
    }
}

/// Load status of one asset kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetStatus {
    #[default]
    Pending,
    Ready,
    /// Failed to load; the prop class is skipped for the rest of the process
    Unavailable,
}

/// What the simulation knows about a loaded model
///
/// Geometry stays with the loader; only the names of sub-objects (for
/// attachment) and the vertical extent (for draw offsets) cross over.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub kind: AssetKind,
    pub sub_objects: HashSet<String>,
    /// Lowest point of the model's bounding box in model space
    pub bounds_min_y: f32,
}

impl LoadedModel {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            sub_objects: HashSet::new(),
            bounds_min_y: 0.0,
        }
    }

    pub fn with_sub_objects<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_objects.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_bounds_min_y(mut self, min_y: f32) -> Self {
        self.bounds_min_y = min_y;
        self
    }

    /// The model as shipped with the game, with every named part present
    pub fn stock(kind: AssetKind) -> Self {
        let model = Self::new(kind);
        match kind {
            AssetKind::PlayerCar => model
                .with_sub_objects(TIRE_NAMES)
                .with_sub_objects(TAIL_LIGHT_NAMES)
                .with_bounds_min_y(-0.05),
            AssetKind::NpcCar => model
                .with_sub_objects(TIRE_NAMES)
                .with_sub_objects(["main_frame"]),
            _ => model,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.sub_objects.contains(name)
    }

    /// Split `names` into those present on the model and those missing
    pub fn lookup<'a>(&self, names: &[&'a str]) -> (Vec<&'a str>, Vec<&'a str>) {
        names.iter().partition(|name| self.has(name))
    }
}

/// Completion message from an asset loader
#[derive(Debug, Clone)]
pub enum AssetEvent {
    Ready(LoadedModel),
    Failed { kind: AssetKind, reason: String },
}

/// Cloneable handle given to loaders
#[derive(Debug, Clone)]
pub struct AssetSender(Sender<AssetEvent>);

impl AssetSender {
    pub fn ready(&self, model: LoadedModel) {
        // The inbox lives as long as the simulation; a send after shutdown is moot
        let _ = self.0.send(AssetEvent::Ready(model));
    }

    pub fn failed(&self, kind: AssetKind, reason: impl Into<String>) {
        let _ = self.0.send(AssetEvent::Failed {
            kind,
            reason: reason.into(),
        });
    }

    /// Announce every asset as its stock model (headless runs and tests)
    pub fn ready_all(&self) {
        for kind in AssetKind::ALL {
            self.ready(LoadedModel::stock(kind));
        }
    }
}

/// Receiving side, owned by the simulation
#[derive(Debug)]
pub struct AssetInbox {
    rx: Receiver<AssetEvent>,
    status: HashMap<AssetKind, AssetStatus>,
    models: HashMap<AssetKind, LoadedModel>,
}

impl AssetInbox {
    /// Create a connected sender/inbox pair
    pub fn channel() -> (AssetSender, AssetInbox) {
        let (tx, rx) = unbounded();
        (
            AssetSender(tx),
            AssetInbox {
                rx,
                status: HashMap::new(),
                models: HashMap::new(),
            },
        )
    }

    /// Apply every event received since the last call
    ///
    /// Returns the kinds that became ready, in arrival order. Repeated ready
    /// events for an already-ready kind are ignored.
    pub fn drain(&mut self) -> Vec<AssetKind> {
        let mut newly_ready = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            match event {
                AssetEvent::Ready(model) => {
                    let kind = model.kind;
                    if self.status(kind) != AssetStatus::Pending {
                        continue;
                    }
                    info!("Asset {:?} ready", kind);
                    self.status.insert(kind, AssetStatus::Ready);
                    self.models.insert(kind, model);
                    newly_ready.push(kind);
                }
                AssetEvent::Failed { kind, reason } => {
                    if self.status(kind) != AssetStatus::Pending {
                        continue;
                    }
                    warn!("Asset {:?} failed to load: {}", kind, reason);
                    self.status.insert(kind, AssetStatus::Unavailable);
                }
            }
        }
        newly_ready
    }

    pub fn status(&self, kind: AssetKind) -> AssetStatus {
        self.status.get(&kind).copied().unwrap_or_default()
    }

    pub fn is_ready(&self, kind: AssetKind) -> bool {
        self.status(kind) == AssetStatus::Ready
    }

    pub fn model(&self, kind: AssetKind) -> Option<&LoadedModel> {
        self.models.get(&kind)
    }
}

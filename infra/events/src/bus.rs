use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{trace, warn};

/// A safe default for broadcast buffers.
/// 128 is usually enough for domain events in a vertical slice.
const DEFAULT_CAPACITY: usize = 128;

/// Supported channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Broadcast (fan-out) semantics.
    Broadcast { capacity: usize },
    /// Watch (latest-value) semantics.
    Watch,
}

/// Marker trait for types that can be sent across the [`EventBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

#[derive(Debug)]
struct ChannelState {
    kind: ChannelKind,
    sender: Box<dyn Any + Send + Sync>,
}

enum ChannelHandle<T> {
    Broadcast(broadcast::Sender<Arc<T>>),
    Watch(watch::Sender<Arc<T>>),
}

impl<T: Event> ChannelHandle<T> {
    fn from_state(state: &ChannelState) -> Result<Self, EventBusError> {
        let mismatch = || EventBusError::TypeMismatch {
            message: std::any::type_name::<T>().into(),
            context: Some("Unexpected event type".into()),
        };

        match state.kind {
            ChannelKind::Broadcast { .. } => state
                .sender
                .downcast_ref::<broadcast::Sender<Arc<T>>>()
                .map(|tx| Self::Broadcast(tx.clone()))
                .ok_or_else(mismatch),
            ChannelKind::Watch => state
                .sender
                .downcast_ref::<watch::Sender<Arc<T>>>()
                .map(|tx| Self::Watch(tx.clone()))
                .ok_or_else(mismatch),
        }
    }
}

/// A thread-safe Event Bus managing channels indexed by the [`TypeId`] of the event.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, ChannelState>>>,
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to an event of type `T` using broadcast with default capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity::<T>(DEFAULT_CAPACITY)
    }

    /// Subscribes to an event of type `T` with a specific broadcast buffer capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`, or [`EventBusError::InvalidCapacity`] if
    /// `capacity` is zero.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        validate_capacity(capacity)?;
        match self.ensure_channel::<T>(ChannelKind::Broadcast { capacity }, None)? {
            ChannelHandle::Broadcast(tx) => Ok(tx.subscribe()),
            ChannelHandle::Watch(_) => Err(kind_mismatch::<T>("Broadcast", "Watch")),
        }
    }

    /// Subscribe to a watch channel (latest-value semantics). Initializes with
    /// the provided value if absent.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    pub fn subscribe_watch<T: Event>(
        &self,
        initial: T,
    ) -> Result<watch::Receiver<Arc<T>>, EventBusError> {
        match self.ensure_channel::<T>(ChannelKind::Watch, Some(Arc::new(initial)))? {
            ChannelHandle::Watch(tx) => Ok(tx.subscribe()),
            ChannelHandle::Broadcast(_) => Err(kind_mismatch::<T>("Watch", "Broadcast")),
        }
    }

    /// Publishes a shared event instance via broadcast.
    ///
    /// Returns the number of active subscribers that received the event; an
    /// event with no subscribers is dropped silently.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publishes a shared event instance via broadcast without re-wrapping.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    pub fn publish_arc<T: Event>(&self, event: Arc<T>) -> Result<usize, EventBusError> {
        let handle =
            self.ensure_channel::<T>(ChannelKind::Broadcast { capacity: DEFAULT_CAPACITY }, None)?;
        let ChannelHandle::Broadcast(tx) = handle else {
            return Err(kind_mismatch::<T>("Broadcast", "Watch"));
        };

        tx.send(event).map_or_else(
            |_| {
                trace!(event = std::any::type_name::<T>(), "Event dropped: no active subscribers");
                Ok(0)
            },
            |count| {
                trace!(event = std::any::type_name::<T>(), count, "Event dispatched");
                Ok(count)
            },
        )
    }

    /// Publishes to a watch channel (latest-value semantics). Creates a channel if missing.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    pub fn publish_watch<T: Event>(&self, event: T) -> Result<(), EventBusError> {
        let arc = Arc::new(event);
        let handle = self.ensure_channel::<T>(ChannelKind::Watch, Some(arc.clone()))?;
        let ChannelHandle::Watch(tx) = handle else {
            return Err(kind_mismatch::<T>("Watch", "Broadcast"));
        };
        tx.send_replace(arc);
        Ok(())
    }

    /// Gracefully shuts down the bus by dropping all underlying channels.
    ///
    /// Returns the number of event channels that were closed.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn ensure_channel<T: Event>(
        &self,
        kind: ChannelKind,
        watch_initial: Option<Arc<T>>,
    ) -> Result<ChannelHandle<T>, EventBusError> {
        let id = TypeId::of::<T>();

        {
            let channels = self.channels.read();
            if let Some(existing) = channels.get(&id) {
                return existing_handle::<T>(existing, kind);
            }
        }

        let mut channels = self.channels.write();
        // Another thread may have initialized the channel between the locks.
        if let Some(existing) = channels.get(&id) {
            return existing_handle::<T>(existing, kind);
        }

        trace!(event = std::any::type_name::<T>(), ?kind, "Initializing new event channel");
        let sender: Box<dyn Any + Send + Sync> = match kind {
            ChannelKind::Broadcast { capacity } => {
                let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
                Box::new(tx)
            },
            ChannelKind::Watch => {
                let initial = watch_initial.ok_or_else(|| EventBusError::TypeMismatch {
                    message: "Watch channel requires an initial value".into(),
                    context: Some(std::any::type_name::<T>().into()),
                })?;
                let (tx, _) = watch::channel::<Arc<T>>(initial);
                Box::new(tx)
            },
        };

        let entry = channels.entry(id).or_insert(ChannelState { kind, sender });
        ChannelHandle::from_state(entry)
    }
}

fn existing_handle<T: Event>(
    existing: &ChannelState,
    requested: ChannelKind,
) -> Result<ChannelHandle<T>, EventBusError> {
    match (existing.kind, requested) {
        (
            ChannelKind::Broadcast { capacity: existing_capacity },
            ChannelKind::Broadcast { capacity },
        ) => {
            if existing_capacity != capacity {
                warn!(
                    event = std::any::type_name::<T>(),
                    existing_capacity,
                    requested_capacity = capacity,
                    "Broadcast channel already initialized with a different capacity"
                );
            }
            ChannelHandle::from_state(existing)
        },
        (ChannelKind::Watch, ChannelKind::Watch) => ChannelHandle::from_state(existing),
        (found, expected) => Err(EventBusError::ChannelKindMismatch {
            message: format!(
                "Expected {:?} but found {:?} for {}",
                expected,
                found,
                std::any::type_name::<T>()
            )
            .into(),
            context: None,
        }),
    }
}

fn kind_mismatch<T>(expected: &str, found: &str) -> EventBusError {
    EventBusError::ChannelKindMismatch {
        message: format!("Expected {} but found {} for {}", expected, found, std::any::type_name::<T>())
            .into(),
        context: None,
    }
}

fn validate_capacity(capacity: usize) -> Result<(), EventBusError> {
    if capacity == 0 {
        return Err(EventBusError::InvalidCapacity {
            message: "capacity must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}

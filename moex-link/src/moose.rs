use moex_core::memo::{Memo, wire};
use parking_lot::Mutex;
use tracing::trace;

/// Device event category, classified from a memo's `(action, mode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A physical tap/click.
    Clicked,
    /// A scroll/pan delta (pixels in value1/value2).
    Scrolled,
    /// A live zoom move (scaling factor in value1).
    WheelMoved,
    /// The start of a zoom gesture.
    ZoomStart,
}

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(DeviceEvent, &Memo) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

/// Fans decoded device messages out to registered listeners. The
/// experiment swaps the active trial's listener in and out as trials
/// change; removal never disturbs the others. Fan-out for one message
/// is synchronous, in registration order.
#[derive(Default)]
pub struct Moose {
    registry: Mutex<Registry>,
}

impl Moose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &self,
        listener: impl FnMut(DeviceEvent, &Memo) + Send + 'static,
    ) -> ListenerId {
        let mut registry = self.registry.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.registry.lock().entries.retain(|(lid, _)| *lid != id);
    }

    /// Classify and dispatch one memo. Unrecognized `(action, mode)`
    /// pairs are silently ignored.
    pub fn process_event(&self, memo: &Memo) {
        let Some(event) = classify(memo) else {
            trace!(action = %memo.action, mode = %memo.mode, "unrecognized device message");
            return;
        };
        let mut registry = self.registry.lock();
        for (_, listener) in registry.entries.iter_mut() {
            listener(event, memo);
        }
    }
}

fn classify(memo: &Memo) -> Option<DeviceEvent> {
    match memo.action.as_str() {
        wire::CLICK => Some(DeviceEvent::Clicked),
        wire::SCROLL => Some(DeviceEvent::Scrolled),
        wire::ZOOM => match memo.mode.as_str() {
            wire::ZOOM => Some(DeviceEvent::WheelMoved),
            wire::ZOOM_START => Some(DeviceEvent::ZoomStart),
            _ => None,
        },
        _ => None,
    }
}

//! PIT channel registry
//!
//! The registry holds each channel's callback and context. The main flow of
//! control writes a channel's slot while the channel's interrupt is disabled.
//! The PIT interrupt handler reads the slot. Slots are atomics, so neither side
//! needs a critical section.

use core::{
    fmt, ptr,
    sync::atomic::{AtomicBool, AtomicPtr, Ordering},
};

/// The number of PIT channels
pub const CHANNEL_COUNT: usize = 4;

/// A PIT channel identifier
///
/// A `Channel` is always in range, so it can index any per-channel table.
///
/// ```
/// use imxrt_pit_hal::pit::Channel;
///
/// assert_eq!(Channel::new(3).map(Channel::index), Some(3));
/// assert!(Channel::new(4).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// All PIT channels, in index order
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel(0), Channel(1), Channel(2), Channel(3)];

    /// Returns the channel at `index`, or `None` if there's no such channel
    pub const fn new(index: usize) -> Option<Self> {
        if index < CHANNEL_COUNT {
            Some(Channel(index as u8))
        } else {
            None
        }
    }

    /// The channel's index, in `0..CHANNEL_COUNT`
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A channel callback
///
/// Handlers run in interrupt context. They must not block, and they should
/// return quickly.
pub type Handler = fn(Context);

/// An opaque value passed to a [`Handler`]
///
/// The driver stores the context, and hands it back to the handler. It never
/// dereferences the context. Create a context from a `'static` reference with
/// [`new`](Context::new), and recover it in the handler with [`get`](Context::get):
///
/// ```
/// use core::sync::atomic::{AtomicU32, Ordering};
/// use imxrt_pit_hal::pit::Context;
///
/// static SAMPLES: AtomicU32 = AtomicU32::new(0);
///
/// fn take_sample(context: Context) {
///     // Safety: registered with a context created from SAMPLES
///     let samples: &AtomicU32 = unsafe { context.get() }.unwrap();
///     samples.fetch_add(1, Ordering::Relaxed);
/// }
///
/// take_sample(Context::new(&SAMPLES));
/// assert_eq!(SAMPLES.load(Ordering::Relaxed), 1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Context(*const ());

// Safety: the driver never dereferences the pointer. The safe constructor
// requires a `Sync` referent, since the handler reads it from an interrupt.
unsafe impl Send for Context {}
unsafe impl Sync for Context {}

impl Context {
    /// The empty context
    pub const NONE: Context = Context(ptr::null());

    /// Create a context that refers to `value`
    pub fn new<T: Sync>(value: &'static T) -> Self {
        Context(value as *const T as *const ())
    }

    /// Create a context from a raw pointer
    ///
    /// The caller owns the pointee, and keeps it valid for as long as the
    /// handler might run.
    pub const fn from_ptr(ptr: *const ()) -> Self {
        Context(ptr)
    }

    /// Returns the raw context pointer
    pub fn as_ptr(self) -> *const () {
        self.0
    }

    /// Returns `true` if this is the empty context
    pub fn is_none(self) -> bool {
        self.0.is_null()
    }

    /// Recover the reference that created this context
    ///
    /// Returns `None` for the empty context.
    ///
    /// # Safety
    ///
    /// `T` must be the type of the value that created the context, and the value
    /// must still be alive.
    pub unsafe fn get<T>(self) -> Option<&'static T> {
        (self.0 as *const T).as_ref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::NONE
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&self.0).finish()
    }
}

/// A channel's registered handler and context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// The callback, if one is registered
    pub handler: Option<Handler>,
    /// The context handed to `handler`
    pub context: Context,
}

impl Binding {
    /// Call the handler with its context
    ///
    /// Does nothing if there's no handler.
    #[inline(always)]
    pub fn invoke(self) {
        if let Some(handler) = self.handler {
            handler(self.context);
        }
    }
}

struct Slot {
    handler: AtomicPtr<()>,
    context: AtomicPtr<()>,
    initialized: AtomicBool,
}

impl Slot {
    const fn new() -> Self {
        Slot {
            handler: AtomicPtr::new(ptr::null_mut()),
            context: AtomicPtr::new(ptr::null_mut()),
            initialized: AtomicBool::new(false),
        }
    }
}

/// Per-channel handlers and contexts
///
/// A registry has one slot for every PIT channel. The crate's PIT interrupt
/// handler reads a single, static registry. You may create your own registry
/// if you're dispatching PIT interrupts yourself.
pub struct Registry {
    slots: [Slot; CHANNEL_COUNT],
}

impl Registry {
    /// Create a registry with no registered channels
    pub const fn new() -> Self {
        Registry {
            slots: [Slot::new(), Slot::new(), Slot::new(), Slot::new()],
        }
    }

    #[inline(always)]
    fn slot(&self, channel: Channel) -> &Slot {
        &self.slots[channel.index()]
    }

    /// Bind `handler` and `context` to `channel`
    ///
    /// A second registration replaces the first. Register while the channel's
    /// interrupt is disabled; otherwise, the interrupt handler may call the old
    /// handler with the new context.
    pub fn register(&self, channel: Channel, handler: Option<Handler>, context: Context) {
        let slot = self.slot(channel);
        let handler = handler.map_or(ptr::null_mut(), |handler| handler as *mut ());
        slot.context.store(context.as_ptr() as *mut (), Ordering::Relaxed);
        slot.handler.store(handler, Ordering::Release);
        slot.initialized.store(true, Ordering::Release);
    }

    /// Returns the handler and context bound to `channel`
    pub fn get(&self, channel: Channel) -> Binding {
        let slot = self.slot(channel);
        let handler = slot.handler.load(Ordering::Acquire);
        let handler = if handler.is_null() {
            None
        } else {
            // Safety: the only non-null values stored in the slot are Handler
            // function pointers.
            Some(unsafe { core::mem::transmute::<*mut (), Handler>(handler) })
        };
        Binding {
            handler,
            context: Context::from_ptr(slot.context.load(Ordering::Relaxed)),
        }
    }

    /// Returns `true` if `channel` has been registered
    pub fn is_initialized(&self, channel: Channel) -> bool {
        self.slot(channel).initialized.load(Ordering::Acquire)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU32;

    fn first(_: Context) {}
    fn second(_: Context) {}

    static CONTEXT_A: u32 = 0xA;
    static CONTEXT_B: u32 = 0xB;

    #[test]
    fn channel_range() {
        for index in 0..CHANNEL_COUNT {
            assert_eq!(Channel::new(index).unwrap().index(), index);
            assert_eq!(Channel::ALL[index].index(), index);
        }
        assert_eq!(Channel::new(CHANNEL_COUNT), None);
        assert_eq!(Channel::new(usize::max_value()), None);
    }

    #[test]
    fn empty_registry() {
        let registry = Registry::new();
        for &channel in Channel::ALL.iter() {
            assert!(!registry.is_initialized(channel));
            let binding = registry.get(channel);
            assert!(binding.handler.is_none());
            assert!(binding.context.is_none());
        }
    }

    #[test]
    fn register_then_get() {
        let registry = Registry::new();
        for &channel in Channel::ALL.iter() {
            let context = Context::new(&CONTEXT_A);
            registry.register(channel, Some(first), context);
            assert!(registry.is_initialized(channel));

            let binding = registry.get(channel);
            assert_eq!(binding.handler.map(|h| h as usize), Some(first as usize));
            assert_eq!(binding.context, context);
        }
    }

    #[test]
    fn registrations_are_independent() {
        let registry = Registry::new();
        let zero = Channel::new(0).unwrap();
        let one = Channel::new(1).unwrap();
        registry.register(zero, Some(first), Context::new(&CONTEXT_A));
        registry.register(one, Some(second), Context::new(&CONTEXT_B));

        let binding = registry.get(zero);
        assert_eq!(binding.handler.map(|h| h as usize), Some(first as usize));
        assert_eq!(unsafe { binding.context.get::<u32>() }, Some(&0xA));

        let binding = registry.get(one);
        assert_eq!(binding.handler.map(|h| h as usize), Some(second as usize));
        assert_eq!(unsafe { binding.context.get::<u32>() }, Some(&0xB));

        assert!(!registry.is_initialized(Channel::new(2).unwrap()));
    }

    #[test]
    fn reregister_overwrites() {
        let registry = Registry::new();
        let channel = Channel::new(2).unwrap();
        registry.register(channel, Some(first), Context::new(&CONTEXT_A));
        registry.register(channel, Some(second), Context::new(&CONTEXT_B));

        let binding = registry.get(channel);
        assert_eq!(binding.handler.map(|h| h as usize), Some(second as usize));
        assert_eq!(binding.context, Context::new(&CONTEXT_B));
    }

    #[test]
    fn register_without_handler() {
        let registry = Registry::new();
        let channel = Channel::new(3).unwrap();
        registry.register(channel, None, Context::NONE);
        assert!(registry.is_initialized(channel));
        assert!(registry.get(channel).handler.is_none());
    }

    #[test]
    fn invoke_passes_context() {
        static COUNT: AtomicU32 = AtomicU32::new(0);
        fn count(context: Context) {
            let count: &AtomicU32 = unsafe { context.get() }.unwrap();
            count.fetch_add(1, Ordering::Relaxed);
        }

        let binding = Binding {
            handler: Some(count),
            context: Context::new(&COUNT),
        };
        binding.invoke();
        binding.invoke();
        assert_eq!(COUNT.load(Ordering::Relaxed), 2);

        Binding {
            handler: None,
            context: Context::new(&COUNT),
        }
        .invoke();
        assert_eq!(COUNT.load(Ordering::Relaxed), 2);
    }
}

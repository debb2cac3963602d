//=========================================================================
// Signal / Connection
//=========================================================================
//
// Typed publish/subscribe primitive used by Window, Keyboard and Mouse.
//
// Architecture:
//   connect(cb) ──> Vec<Rc<Slot>>  (insertion order, monotonic ids)
//                         ↓
//   emit(&args) ──> snapshot ──> call every slot still active
//                         ↓
//   outermost emit ends ──> compact inactive slots
//
// Re-entrancy rules:
// - A slot connected during an emission is not called in that pass
// - A slot disconnected before its turn is skipped
// - A slot whose callback is already running (recursive emit) is skipped
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

//=== External Crates =====================================================

use log::trace;

//=== Slot ================================================================

struct Slot<A: ?Sized> {
    id: u64,
    active: Cell<bool>,
    callback: RefCell<Box<dyn FnMut(&A)>>,
}

//=== Shared State ========================================================

struct SignalState<A: ?Sized> {
    next_id: Cell<u64>,
    slots: RefCell<Vec<Rc<Slot<A>>>>,
    emit_depth: Cell<usize>,
}

impl<A: ?Sized> SignalState<A> {
    fn compact(&self) {
        self.slots.borrow_mut().retain(|slot| slot.active.get());
    }
}

/// Leaves one emission level on drop, including while unwinding out of a
/// panicking callback. The outermost level compacts.
struct EmitDepth<'a, A: ?Sized> {
    state: &'a SignalState<A>,
}

impl<A: ?Sized> Drop for EmitDepth<'_, A> {
    fn drop(&mut self) {
        let depth = self.state.emit_depth.get().saturating_sub(1);
        self.state.emit_depth.set(depth);
        if depth == 0 {
            self.state.compact();
        }
    }
}

/// Type-erased view used by [`Connection`] to release its slot.
trait SlotOwner {
    fn release(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

impl<A: ?Sized> SlotOwner for SignalState<A> {
    fn release(&self, id: u64) -> bool {
        let released = self
            .slots
            .borrow()
            .iter()
            .find(|slot| slot.id == id && slot.active.get())
            .map(|slot| slot.active.set(false))
            .is_some();

        // Never shrink the list under a running emission.
        if released && self.emit_depth.get() == 0 {
            self.compact();
        }
        released
    }

    fn contains(&self, id: u64) -> bool {
        self.slots
            .borrow()
            .iter()
            .any(|slot| slot.id == id && slot.active.get())
    }
}

//=== Signal ==============================================================

/// Ordered, synchronous, multi-subscriber publish point.
///
/// `A` is the payload type handed to each callback by reference. Unsized
/// payloads such as `str` are supported, so a text signal is `Signal<str>`.
///
/// Signals are single-threaded (`!Send`): callbacks run on the emitting
/// thread, in the order they were connected, exactly once per emission.
///
/// # Examples
///
/// ```
/// use rime_engine::core::signal::Signal;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let signal = Signal::<u32>::new();
/// let total = Rc::new(Cell::new(0));
///
/// let sink = total.clone();
/// let connection = signal.connect(move |value| sink.set(sink.get() + value));
///
/// signal.emit(&5);
/// connection.disconnect();
/// signal.emit(&5);
///
/// assert_eq!(total.get(), 5);
/// ```
pub struct Signal<A: ?Sized> {
    state: Rc<SignalState<A>>,
}

impl<A: ?Sized + 'static> Signal<A> {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            state: Rc::new(SignalState {
                next_id: Cell::new(1),
                slots: RefCell::new(Vec::new()),
                emit_depth: Cell::new(0),
            }),
        }
    }

    //--- Subscription -----------------------------------------------------

    /// Registers `callback` and returns the handle that revokes it.
    ///
    /// Dropping the returned [`Connection`] does NOT disconnect; use
    /// [`Connection::scoped`] for that.
    pub fn connect<F>(&self, callback: F) -> Connection
    where
        F: FnMut(&A) + 'static,
    {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);

        self.state.slots.borrow_mut().push(Rc::new(Slot {
            id,
            active: Cell::new(true),
            callback: RefCell::new(Box::new(callback)),
        }));

        let owner: Rc<dyn SlotOwner> = self.state.clone();
        Connection {
            id,
            owner: Rc::downgrade(&owner),
        }
    }

    /// Disconnects every slot.
    pub fn disconnect_all(&self) {
        for slot in self.state.slots.borrow().iter() {
            slot.active.set(false);
        }
        if self.state.emit_depth.get() == 0 {
            self.state.compact();
        }
    }

    //--- Emission ---------------------------------------------------------

    /// Invokes every connected callback with `args`, in connection order.
    pub fn emit(&self, args: &A) {
        let snapshot: Vec<Rc<Slot<A>>> = self.state.slots.borrow().clone();

        self.state.emit_depth.set(self.state.emit_depth.get() + 1);
        let _depth = EmitDepth { state: &self.state };

        for slot in &snapshot {
            if !slot.active.get() {
                continue;
            }
            match slot.callback.try_borrow_mut() {
                Ok(mut callback) => (*callback)(args),
                Err(_) => {
                    trace!(target: "signal", "Skipping slot {} (already running)", slot.id);
                }
            }
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.state
            .slots
            .borrow()
            .iter()
            .filter(|slot| slot.active.get())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: ?Sized + 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.state.slots.borrow();
        f.debug_struct("Signal")
            .field("connections", &slots.iter().filter(|s| s.active.get()).count())
            .finish()
    }
}

//=== Connection ==========================================================

/// Revocable handle to one signal subscription.
///
/// Holds only a weak reference: it neither keeps the signal alive nor
/// disconnects on drop. Disconnecting after the signal is gone is a no-op.
#[derive(Clone)]
pub struct Connection {
    id: u64,
    owner: Weak<dyn SlotOwner>,
}

impl Connection {
    /// Removes the subscription. Safe to call from inside the callback
    /// itself and safe to call more than once.
    pub fn disconnect(&self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.release(self.id);
        }
    }

    /// Returns `true` while the subscription is live.
    pub fn is_connected(&self) -> bool {
        self.owner
            .upgrade()
            .map(|owner| owner.contains(self.id))
            .unwrap_or(false)
    }

    /// Turns this handle into a guard that disconnects when dropped.
    pub fn scoped(self) -> ScopedConnection {
        ScopedConnection { inner: self }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Connection guard that disconnects on drop.
#[derive(Debug)]
pub struct ScopedConnection {
    inner: Connection,
}

impl ScopedConnection {
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Releases the guard without disconnecting.
    pub fn release(self) -> Connection {
        let inner = self.inner.clone();
        std::mem::forget(self);
        inner
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.inner.disconnect();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnMut(&u32)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &'static str| -> Box<dyn FnMut(&u32)> {
            let sink = sink.clone();
            Box::new(move |_| sink.borrow_mut().push(name))
        };
        (log, make)
    }

    //=====================================================================
    // Ordering
    //=====================================================================

    #[test]
    fn emits_in_connection_order_exactly_once() {
        let signal = Signal::<u32>::new();
        let (log, make) = recorder();

        signal.connect(make("a"));
        signal.connect(make("b"));
        signal.connect(make("c"));

        signal.emit(&0);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn no_deduplication_of_identical_callbacks() {
        let signal = Signal::<u32>::new();
        let count = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let count = count.clone();
            signal.connect(move |_| count.set(count.get() + 1));
        }

        signal.emit(&0);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn payload_reaches_callback() {
        let signal = Signal::<(i32, i32)>::new();
        let seen = Rc::new(Cell::new((0, 0)));
        let sink = seen.clone();
        signal.connect(move |pair| sink.set(*pair));

        signal.emit(&(3, -4));
        assert_eq!(seen.get(), (3, -4));
    }

    #[test]
    fn unsized_payload() {
        let signal = Signal::<str>::new();
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = seen.clone();
        signal.connect(move |text| sink.borrow_mut().push_str(text));

        signal.emit("hé");
        assert_eq!(*seen.borrow(), "hé");
    }

    //=====================================================================
    // Disconnection
    //=====================================================================

    #[test]
    fn disconnected_slot_is_excluded() {
        let signal = Signal::<u32>::new();
        let (log, make) = recorder();

        signal.connect(make("a"));
        let b = signal.connect(make("b"));
        signal.connect(make("c"));

        b.disconnect();
        assert!(!b.is_connected());
        assert_eq!(signal.len(), 2);

        signal.emit(&0);
        assert_eq!(*log.borrow(), vec!["a", "c"]);
    }

    #[test]
    fn disconnect_twice_is_harmless() {
        let signal = Signal::<u32>::new();
        let c = signal.connect(|_| {});
        c.disconnect();
        c.disconnect();
        assert!(signal.is_empty());
    }

    #[test]
    fn disconnect_from_inside_own_callback() {
        let signal = Signal::<u32>::new();
        let count = Rc::new(Cell::new(0));
        let handle: Rc<RefCell<Option<Connection>>> = Rc::new(RefCell::new(None));

        let counter = count.clone();
        let me = handle.clone();
        let connection = signal.connect(move |_| {
            counter.set(counter.get() + 1);
            if let Some(c) = me.borrow().as_ref() {
                c.disconnect();
            }
        });
        *handle.borrow_mut() = Some(connection);

        signal.emit(&0);
        signal.emit(&0);
        assert_eq!(count.get(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn disconnecting_a_later_slot_during_emission_skips_it() {
        let signal = Signal::<u32>::new();
        let (log, make) = recorder();
        let victim: Rc<RefCell<Option<Connection>>> = Rc::new(RefCell::new(None));

        let target = victim.clone();
        let sink = log.clone();
        signal.connect(move |_| {
            sink.borrow_mut().push("killer");
            if let Some(c) = target.borrow().as_ref() {
                c.disconnect();
            }
        });
        *victim.borrow_mut() = Some(signal.connect(make("victim")));
        signal.connect(make("after"));

        signal.emit(&0);
        assert_eq!(*log.borrow(), vec!["killer", "after"]);
    }

    #[test]
    fn connection_outliving_signal_is_inert() {
        let signal = Signal::<u32>::new();
        let c = signal.connect(|_| {});
        drop(signal);
        assert!(!c.is_connected());
        c.disconnect();
    }

    #[test]
    fn scoped_connection_disconnects_on_drop() {
        let signal = Signal::<u32>::new();
        {
            let _guard = signal.connect(|_| {}).scoped();
            assert_eq!(signal.len(), 1);
        }
        assert!(signal.is_empty());
    }

    #[test]
    fn released_scoped_connection_stays_connected() {
        let signal = Signal::<u32>::new();
        let c = signal.connect(|_| {}).scoped().release();
        assert!(c.is_connected());
        assert_eq!(signal.len(), 1);
    }

    #[test]
    fn disconnect_all_clears_every_slot() {
        let signal = Signal::<u32>::new();
        let a = signal.connect(|_| {});
        let b = signal.connect(|_| {});
        signal.disconnect_all();
        assert!(!a.is_connected() && !b.is_connected());
        assert!(signal.is_empty());
    }

    //=====================================================================
    // Re-entrancy
    //=====================================================================

    #[test]
    fn connect_during_emission_waits_for_next_pass() {
        let signal = Rc::new(Signal::<u32>::new());
        let late_calls = Rc::new(Cell::new(0));
        let added = Rc::new(Cell::new(false));

        let sig = signal.clone();
        let late = late_calls.clone();
        let flag = added.clone();
        signal.connect(move |_| {
            if !flag.get() {
                flag.set(true);
                let late = late.clone();
                sig.connect(move |_| late.set(late.get() + 1));
            }
        });

        signal.emit(&0);
        assert_eq!(late_calls.get(), 0, "new slot must not run in the current pass");

        signal.emit(&0);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn recursive_emit_skips_running_slot() {
        let signal = Rc::new(Signal::<u32>::new());
        let outer = Rc::new(Cell::new(0));
        let inner = Rc::new(Cell::new(0));

        let sig = signal.clone();
        let outer_count = outer.clone();
        signal.connect(move |depth| {
            outer_count.set(outer_count.get() + 1);
            if *depth == 0 {
                sig.emit(&1);
            }
        });
        let inner_count = inner.clone();
        signal.connect(move |_| inner_count.set(inner_count.get() + 1));

        signal.emit(&0);
        assert_eq!(outer.get(), 1);
        assert_eq!(inner.get(), 2);
    }

    #[test]
    fn panicking_slot_still_ends_emission() {
        // The crash hook must not be installed while this test panics.
        let _guard = crate::core::debug::tests::global_lock();
        let signal = Signal::<u32>::new();
        signal.connect(|value| {
            if *value == 1 {
                panic!("slot failure");
            }
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| signal.emit(&1)));
        assert!(result.is_err());
        assert_eq!(signal.state.emit_depth.get(), 0);

        for _ in 0..100 {
            signal.connect(|_| {}).disconnect();
        }
        assert_eq!(signal.len(), 1);
        assert_eq!(signal.state.slots.borrow().len(), 1);

        // The slot that panicked is still usable.
        signal.emit(&0);
    }

    #[test]
    fn ids_are_monotonic() {
        let signal = Signal::<u32>::new();
        let a = signal.connect(|_| {});
        a.disconnect();
        let b = signal.connect(|_| {});
        assert!(b.id > a.id);
    }
}

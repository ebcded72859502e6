use crate::core::detector::Detector;
use crate::core::locks::NEXT_LOCK_ID;
use crate::core::types::{LockId, LockState, ThreadId, get_current_thread_id};
use parking_lot::{Mutex as ParkingLotMutex, MutexGuard as ParkingLotMutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

// Thread ids start at 1.
const NO_HOLDER: usize = 0;

/// A mutex that knows who holds it
///
/// Acquisition blocks without bound, exactly like the wrapped `parking_lot`
/// mutex. The lock records its current holder so that observers can read its
/// [`LockState`], and it optionally reports every operation to a [`Detector`].
///
/// # Example
///
/// ```rust
/// use deadlock_demo::{LockState, Mutex, get_current_thread_id};
///
/// let mutex = Mutex::new(42);
/// {
///     let guard = mutex.lock();
///     assert_eq!(*guard, 42);
///     assert_eq!(mutex.state(), LockState::HeldBy(get_current_thread_id()));
/// } // released here
/// assert_eq!(mutex.state(), LockState::Free);
/// ```
pub struct Mutex<T> {
    /// Unique identifier for this mutex
    id: LockId,
    /// The wrapped mutex
    inner: ParkingLotMutex<T>,
    /// Current holder, `NO_HOLDER` when free
    holder: AtomicUsize,
    /// Thread that created this mutex
    creator_thread_id: ThreadId,
    detector: Option<Detector>,
}

/// Guard for a [`Mutex`]; releases the lock when dropped
pub struct MutexGuard<'a, T> {
    thread_id: ThreadId,
    mutex: &'a Mutex<T>,
    guard: ParkingLotMutexGuard<'a, T>,
}

impl<T> Mutex<T> {
    /// Create an untracked mutex
    pub fn new(value: T) -> Self {
        Self::build(value, None)
    }

    /// Create a mutex that reports its operations to `detector`
    pub fn tracked(value: T, detector: &Detector) -> Self {
        Self::build(value, Some(detector.clone()))
    }

    fn build(value: T, detector: Option<Detector>) -> Self {
        let id = NEXT_LOCK_ID.fetch_add(1, Ordering::SeqCst);
        let creator_thread_id = get_current_thread_id();

        if let Some(detector) = &detector {
            detector.on_mutex_create(id, creator_thread_id);
        }

        Mutex {
            id,
            inner: ParkingLotMutex::new(value),
            holder: AtomicUsize::new(NO_HOLDER),
            creator_thread_id,
            detector,
        }
    }

    /// Get the ID of this mutex
    pub fn id(&self) -> LockId {
        self.id
    }

    /// Get the ID of the thread that created this mutex
    pub fn creator_thread_id(&self) -> ThreadId {
        self.creator_thread_id
    }

    pub fn is_tracked(&self) -> bool {
        self.detector.is_some()
    }

    /// Current state of the lock
    ///
    /// The holder is recorded right after acquisition and cleared right before
    /// release, so a thread always sees `HeldBy(itself)` while it holds a guard.
    pub fn state(&self) -> LockState {
        match self.holder.load(Ordering::SeqCst) {
            NO_HOLDER => LockState::Free,
            thread_id => LockState::HeldBy(thread_id),
        }
    }

    /// Block until the lock is free, then take it
    ///
    /// There is no timeout: if the holder never lets go, neither does this call.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        let thread_id = get_current_thread_id();

        if let Some(detector) = &self.detector {
            detector.on_mutex_attempt(thread_id, self.id);
        }

        let guard = self.inner.lock();
        self.on_acquired(thread_id, guard)
    }

    /// Take the lock only if nobody holds it
    ///
    /// # Example
    ///
    /// ```rust
    /// use deadlock_demo::Mutex;
    ///
    /// let mutex = Mutex::new(());
    /// let held = mutex.lock();
    /// assert!(mutex.try_lock().is_none());
    /// drop(held);
    /// assert!(mutex.try_lock().is_some());
    /// ```
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        let thread_id = get_current_thread_id();
        let guard = self.inner.try_lock()?;
        Some(self.on_acquired(thread_id, guard))
    }

    fn on_acquired<'a>(
        &'a self,
        thread_id: ThreadId,
        guard: ParkingLotMutexGuard<'a, T>,
    ) -> MutexGuard<'a, T> {
        self.holder.store(thread_id, Ordering::SeqCst);
        if let Some(detector) = &self.detector {
            detector.on_mutex_acquired(thread_id, self.id);
        }
        MutexGuard {
            thread_id,
            mutex: self,
            guard,
        }
    }
}

impl<T> Drop for Mutex<T> {
    fn drop(&mut self) {
        if let Some(detector) = &self.detector {
            detector.on_mutex_destroy(self.id);
        }
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Mutex<T> {
        Mutex::new(Default::default())
    }
}

impl<T> MutexGuard<'_, T> {
    /// ID of the mutex this guard holds
    pub fn lock_id(&self) -> LockId {
        self.mutex.id
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.guard.deref()
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard.deref_mut()
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        // The inner guard unlocks after this body runs.
        self.mutex.holder.store(NO_HOLDER, Ordering::SeqCst);
        if let Some(detector) = &self.mutex.detector {
            detector.on_mutex_release(self.thread_id, self.mutex.id);
        }
    }
}

//! Fixed-storage, type-erased callable with no heap allocation and no
//! `dyn` dispatch: a tagged value holding at most one function-pointer
//! "vtable" plus inline byte storage for the closure's captures.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;

use crate::error::TaskError;

/// Alignment guaranteed for inline storage. Covers everything the pool
/// needs to capture (primitives, pointers, small structs); callables that
/// need more are rejected at compile time by [`InlineCallable::new`].
const INLINE_ALIGN: usize = 16;

#[repr(align(16))]
struct Storage<const N: usize>(MaybeUninit<[u8; N]>);

impl<const N: usize> Storage<N> {
    fn uninit() -> Self {
        Self(MaybeUninit::uninit())
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr().cast::<u8>()
    }
}

/// The two function pointers that make invocation and destruction of the
/// erased callable possible without `dyn` dispatch.
struct VTable {
    /// Calls the stored closure, consuming it, passing the executing
    /// worker's id. Nullary callables are normalized to ignore the id (see
    /// `InlineCallable::from_nullary`). Panics propagate to the caller —
    /// containing them is the invoker's job (see `crate::worker`), not this
    /// type's.
    invoke: unsafe fn(*mut u8, usize),
    /// Runs the stored value's destructor in place, without invoking it.
    drop_in_place: unsafe fn(*mut u8),
}

impl VTable {
    const fn for_type<F>() -> &'static VTable
    where
        F: FnOnce(usize) + Send + 'static,
    {
        unsafe fn invoke_impl<F: FnOnce(usize) + Send + 'static>(ptr: *mut u8, worker_id: usize) {
            let f = unsafe { ptr.cast::<F>().read() };
            f(worker_id);
        }

        unsafe fn drop_impl<F: FnOnce(usize) + Send + 'static>(ptr: *mut u8) {
            unsafe { ptr::drop_in_place(ptr.cast::<F>()) }
        }

        &VTable {
            invoke: invoke_impl::<F>,
            drop_in_place: drop_impl::<F>,
        }
    }
}

const fn assert_fits<F, const N: usize>() {
    assert!(
        std::mem::size_of::<F>() <= N,
        "callable does not fit in inline storage"
    );
    assert!(
        std::mem::align_of::<F>() <= INLINE_ALIGN,
        "callable alignment exceeds inline storage alignment"
    );
}

/// A move-only, non-copyable container holding at most one worker-id-aware
/// nullary callable in `N` bytes of inline storage.
///
/// `N = 128` is used for [`crate::worker::Task`] (the pool's unit of work); smaller
/// instantiations are usable anywhere a fixed-size, allocation-free callable
/// is needed.
pub(crate) struct InlineCallable<const N: usize> {
    storage: UnsafeCell<Storage<N>>,
    vtable: Option<&'static VTable>,
}

unsafe impl<const N: usize> Send for InlineCallable<N> {}

impl<const N: usize> InlineCallable<N> {
    /// An empty callable. Invoking it fails with `EmptyCallable`.
    pub(crate) fn empty() -> Self {
        Self {
            storage: UnsafeCell::new(Storage::uninit()),
            vtable: None,
        }
    }

    /// Moves `f` into inline storage. `F` must fit; violations are a
    /// compile-time error (checked once per monomorphization).
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: FnOnce(usize) + Send + 'static,
    {
        const { assert_fits::<F, N>() };
        let mut storage = Storage::<N>::uninit();
        unsafe { storage.as_mut_ptr().cast::<F>().write(f) };
        Self {
            storage: UnsafeCell::new(storage),
            vtable: Some(VTable::for_type::<F>()),
        }
    }

    /// Wraps a plain nullary callable, normalizing it to ignore the worker
    /// id the pool always passes at invocation time.
    pub(crate) fn from_nullary<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(move |_worker_id: usize| f())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.vtable.is_none()
    }

    /// Executes the stored callable, consuming this container. Panics
    /// raised by the callable propagate to the caller unwound — containing
    /// them is the caller's job (see `crate::worker::dispatch_loop`, which
    /// wraps every invocation in `catch_unwind`).
    pub(crate) fn invoke(mut self, worker_id: usize) -> Result<(), TaskError> {
        match self.vtable.take() {
            None => Err(TaskError::EmptyCallable),
            Some(vt) => {
                let ptr = self.storage.get_mut().as_mut_ptr();
                unsafe { (vt.invoke)(ptr, worker_id) };
                Ok(())
            }
        }
    }
}

impl<const N: usize> Drop for InlineCallable<N> {
    fn drop(&mut self) {
        if let Some(vt) = self.vtable {
            let ptr = self.storage.get_mut().as_mut_ptr();
            unsafe { (vt.drop_in_place)(ptr) };
        }
    }
}

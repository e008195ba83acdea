//! Owning handles for GPU objects.
//!
//! Every buffer, texture, sampler, shader module, bind group and pipeline the
//! frame pipeline creates is wrapped in [`Owned`]. Creation and release are
//! recorded in a per-thread ledger; GPU objects never leave the thread that
//! runs the render loop, so the ledger is exact.

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    TextureView,
    Sampler,
    ShaderModule,
    BindGroupLayout,
    BindGroup,
    PipelineLayout,
    RenderPipeline,
}

const KIND_COUNT: usize = 9;

impl ResourceKind {
    pub const ALL: [ResourceKind; KIND_COUNT] = [
        ResourceKind::Buffer,
        ResourceKind::Texture,
        ResourceKind::TextureView,
        ResourceKind::Sampler,
        ResourceKind::ShaderModule,
        ResourceKind::BindGroupLayout,
        ResourceKind::BindGroup,
        ResourceKind::PipelineLayout,
        ResourceKind::RenderPipeline,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

thread_local! {
    static LIVE: Cell<[usize; KIND_COUNT]> = const { Cell::new([0; KIND_COUNT]) };
}

fn adjust(kind: ResourceKind, acquire: bool) {
    LIVE.with(|live| {
        let mut counts = live.get();
        let slot = &mut counts[kind.index()];
        if acquire {
            *slot += 1;
        } else {
            debug_assert!(*slot > 0, "{kind:?} released more often than created");
            *slot = slot.saturating_sub(1);
        }
        live.set(counts);
    });
}

/// Live objects of `kind` created on this thread.
pub fn live_count(kind: ResourceKind) -> usize {
    LIVE.with(|live| live.get()[kind.index()])
}

/// Live objects of every kind created on this thread.
pub fn live_total() -> usize {
    LIVE.with(|live| live.get().iter().sum())
}

/// Exclusive owner of one GPU object.
///
/// Dropping the handle releases the object exactly once.
pub struct Owned<T> {
    kind: ResourceKind,
    label: &'static str,
    inner: T,
}

impl<T> Owned<T> {
    pub fn new(kind: ResourceKind, label: &'static str, inner: T) -> Self {
        adjust(kind, true);
        log::trace!("acquire {kind:?} {label:?}");
        Self { kind, label, inner }
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> Drop for Owned<T> {
    fn drop(&mut self) {
        adjust(self.kind, false);
        log::trace!("release {:?} {:?}", self.kind, self.label);
    }
}

impl<T> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_drop_balance() {
        let before = live_total();
        let buffers = live_count(ResourceKind::Buffer);
        let a = Owned::new(ResourceKind::Buffer, "a", ());
        let b = Owned::new(ResourceKind::Texture, "b", ());
        assert_eq!(live_total(), before + 2);
        assert_eq!(live_count(ResourceKind::Buffer), buffers + 1);
        drop(a);
        drop(b);
        assert_eq!(live_total(), before);
    }

    #[test]
    fn moving_a_handle_does_not_release() {
        let samplers = live_count(ResourceKind::Sampler);
        let h = Owned::new(ResourceKind::Sampler, "s", 7u32);
        let moved = vec![h];
        assert_eq!(live_count(ResourceKind::Sampler), samplers + 1);
        assert_eq!(*moved[0], 7);
        drop(moved);
        assert_eq!(live_count(ResourceKind::Sampler), samplers);
    }

    #[test]
    fn kinds_have_distinct_slots() {
        for (i, k) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
    }
}

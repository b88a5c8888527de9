/// Whether published indexes have caught up with a catalog's packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataState {
    #[default]
    Clean,
    /// Packages were added since the last publish
    Dirty,
}

impl MetadataState {
    pub fn mark_dirty(&mut self) {
        *self = MetadataState::Dirty;
    }

    /// Transition after a successful publish.
    pub fn publish(&mut self) {
        *self = MetadataState::Clean;
    }

    pub fn is_dirty(self) -> bool {
        self == MetadataState::Dirty
    }
}

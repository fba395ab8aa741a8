//! Game-object lifecycle hooks.
//!
//! [`Sprite`] is the capability set a sprite framework expects from every game
//! object: per-frame update, group membership and kill. Every hook has a no-op
//! default, so an implementor only overrides what it actually tracks.

/// Identity of a sprite group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

/// Lifecycle hooks for anything that takes part in update/group/kill.
///
/// The default bodies do nothing and never fail. `alive` and `groups` report
/// "no value" as `false` and an empty slice.
pub trait Sprite {
    /// Advance the object by `dt` seconds.
    fn update(&mut self, _dt: f32) {}

    /// Join every group in `groups`.
    fn add(&mut self, _groups: &[GroupId]) {}

    /// Leave every group in `groups`.
    fn remove(&mut self, _groups: &[GroupId]) {}

    /// Leave all groups.
    fn kill(&mut self) {}

    fn alive(&self) -> bool {
        false
    }

    fn groups(&self) -> &[GroupId] {
        &[]
    }
}

/// A sprite that only has the default hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullSprite;

impl Sprite for NullSprite {}

/// Group bookkeeping that concrete sprites can embed and delegate to.
///
/// Groups are kept in insertion order and never duplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Membership {
    groups: Vec<GroupId>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }
}

impl Sprite for Membership {
    fn add(&mut self, groups: &[GroupId]) {
        for &group in groups {
            if !self.groups.contains(&group) {
                self.groups.push(group);
            }
        }
    }

    fn remove(&mut self, groups: &[GroupId]) {
        self.groups.retain(|g| !groups.contains(g));
    }

    fn kill(&mut self) {
        self.groups.clear();
    }

    fn alive(&self) -> bool {
        !self.groups.is_empty()
    }

    fn groups(&self) -> &[GroupId] {
        &self.groups
    }
}

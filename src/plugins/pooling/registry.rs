use std::fmt;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use serde::Deserialize;

use super::error::PoolError;
use super::prefab::{PoolContainer, PoolMember, Prefab};

/// Opaque key for a kind of reusable entity.
///
/// Two members of the same template are interchangeable; distinct templates never share a
/// pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(u32);

impl TemplateId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// Proof of one particular borrow.
///
/// The generation changes on every borrow of the same entity, so a lease held by a stale
/// callback can't deactivate whoever borrowed the entity next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lease {
    entity: Entity,
    template: TemplateId,
    generation: u32,
}

impl Lease {
    #[inline]
    pub fn entity(self) -> Entity {
        self.entity
    }

    #[inline]
    pub fn template(self) -> TemplateId {
        self.template
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// What a return actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Active -> inactive.
    Deactivated,
    /// Already inactive; nothing changed.
    AlreadyInactive,
    /// The lease belongs to an earlier borrow; nothing changed.
    Stale,
}

#[derive(Debug)]
struct Member {
    entity: Entity,
    active: bool,
    generation: u32,
}

#[derive(Debug)]
struct Pool {
    label: String,
    members: Vec<Member>,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    template: TemplateId,
    index: usize,
}

/// Owner of every pool in the session.
///
/// Only `create_pool`/`grow_pool` touch the mapping. `borrow`/`release` flip per-member
/// flags. Exclusive `ResMut` access serializes all of it, so no two borrows in a tick can
/// claim the same member.
#[derive(Resource, Debug)]
pub struct PoolRegistry {
    default_size: usize,
    container: Option<Entity>,
    pools: HashMap<TemplateId, Pool>,
    slots: HashMap<Entity, Slot>,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PoolRegistry {
    pub fn new(default_size: usize) -> Self {
        Self {
            default_size,
            container: None,
            pools: HashMap::default(),
            slots: HashMap::default(),
        }
    }

    #[inline]
    pub fn default_size(&self) -> usize {
        self.default_size
    }

    /// The container entity, once the first pool has been created.
    #[inline]
    pub fn container(&self) -> Option<Entity> {
        self.container
    }

    /// Pre-spawn `size` inactive members of `prefab`.
    ///
    /// Creating a pool twice is a logged no-op.
    pub fn create_pool<P: Prefab + ?Sized>(
        &mut self,
        commands: &mut Commands,
        prefab: &P,
        size: usize,
    ) -> Result<(), PoolError> {
        let template = prefab.template();

        if self.pools.contains_key(&template) {
            warn!("Pool for {} already exists.", prefab.label());
            return Err(PoolError::PoolAlreadyExists { template });
        }
        if size == 0 {
            warn!("Refusing to create an empty pool for {}.", prefab.label());
            return Err(PoolError::EmptyPool { template });
        }

        let container = self.ensure_container(commands);
        let mut pool = Pool {
            label: prefab.label().to_owned(),
            members: Vec::with_capacity(size),
        };
        spawn_members(commands, prefab, container, &mut pool, &mut self.slots, size);
        self.pools.insert(template, pool);

        info!("Pool created for {} with {size} objects.", prefab.label());
        Ok(())
    }

    /// `create_pool` with the configured default size.
    pub fn create_default_pool<P: Prefab + ?Sized>(
        &mut self,
        commands: &mut Commands,
        prefab: &P,
    ) -> Result<(), PoolError> {
        self.create_pool(commands, prefab, self.default_size)
    }

    /// Explicitly add `additional` members to an existing pool. Returns the new size.
    ///
    /// `borrow` never grows a pool on its own.
    pub fn grow_pool<P: Prefab + ?Sized>(
        &mut self,
        commands: &mut Commands,
        prefab: &P,
        additional: usize,
    ) -> Result<usize, PoolError> {
        let template = prefab.template();
        if !self.pools.contains_key(&template) {
            error!("No pool found for {} to grow.", prefab.label());
            return Err(PoolError::PoolNotFound { template });
        }

        let container = self.ensure_container(commands);
        let Some(pool) = self.pools.get_mut(&template) else {
            return Err(PoolError::PoolNotFound { template });
        };
        spawn_members(commands, prefab, container, pool, &mut self.slots, additional);

        info!("Pool for {} grown to {} objects.", pool.label, pool.members.len());
        Ok(pool.members.len())
    }

    #[inline]
    pub fn pool_exists(&self, template: TemplateId) -> bool {
        self.pools.contains_key(&template)
    }

    /// `pool_exists` for callers that may not have a template at all.
    #[inline]
    pub fn pool_exists_opt(&self, template: Option<TemplateId>) -> bool {
        template.is_some_and(|t| self.pool_exists(t))
    }

    pub fn pool_size(&self, template: TemplateId) -> Option<usize> {
        self.pools.get(&template).map(|p| p.members.len())
    }

    /// Number of members currently free to borrow.
    pub fn available(&self, template: TemplateId) -> Option<usize> {
        self.pools
            .get(&template)
            .map(|p| p.members.iter().filter(|m| !m.active).count())
    }

    /// Members of `template` in creation order (empty if there is no such pool).
    pub fn members(&self, template: TemplateId) -> impl Iterator<Item = Entity> + '_ {
        self.pools
            .get(&template)
            .into_iter()
            .flat_map(|p| p.members.iter().map(|m| m.entity))
    }

    /// `None` if `handle` isn't pooled.
    pub fn is_active(&self, handle: Entity) -> Option<bool> {
        self.member(handle).map(|m| m.active)
    }

    pub fn template_of(&self, handle: Entity) -> Option<TemplateId> {
        self.slots.get(&handle).map(|s| s.template)
    }

    /// Claim the first inactive member, in creation order.
    pub fn borrow(&mut self, template: TemplateId) -> Result<Lease, PoolError> {
        let Some(pool) = self.pools.get_mut(&template) else {
            error!("No pool found for {template}.");
            return Err(PoolError::PoolNotFound { template });
        };

        let Some(member) = pool.members.iter_mut().find(|m| !m.active) else {
            warn!(
                "No inactive objects available in pool for {}. Consider expanding the pool.",
                pool.label
            );
            return Err(PoolError::PoolExhausted { template });
        };

        member.active = true;
        member.generation = member.generation.wrapping_add(1);

        Ok(Lease {
            entity: member.entity,
            template,
            generation: member.generation,
        })
    }

    /// Return a member by handle. Returning an inactive member is a no-op.
    pub fn release(&mut self, handle: Entity) -> Result<ReleaseOutcome, PoolError> {
        let member = self.member_mut(handle)?;
        if !member.active {
            return Ok(ReleaseOutcome::AlreadyInactive);
        }
        member.active = false;
        Ok(ReleaseOutcome::Deactivated)
    }

    /// Return a member only if `lease` is from its current borrow.
    pub fn release_lease(&mut self, lease: Lease) -> Result<ReleaseOutcome, PoolError> {
        let member = self.member_mut(lease.entity)?;
        if member.generation != lease.generation {
            debug!(
                "Ignoring stale lease on {:?} (generation {} != {}).",
                lease.entity, lease.generation, member.generation
            );
            return Ok(ReleaseOutcome::Stale);
        }
        if !member.active {
            return Ok(ReleaseOutcome::AlreadyInactive);
        }
        member.active = false;
        Ok(ReleaseOutcome::Deactivated)
    }

    /// Deactivate every member of every pool. Returns how many were active.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for member in self.pools.values_mut().flat_map(|p| p.members.iter_mut()) {
            if member.active {
                member.active = false;
                released += 1;
            }
        }
        released
    }

    fn ensure_container(&mut self, commands: &mut Commands) -> Entity {
        *self.container.get_or_insert_with(|| {
            commands
                .spawn((
                    Name::new("PoolContainer"),
                    PoolContainer,
                    Transform::default(),
                    Visibility::default(),
                ))
                .id()
        })
    }

    fn member(&self, handle: Entity) -> Option<&Member> {
        let slot = self.slots.get(&handle)?;
        self.pools.get(&slot.template)?.members.get(slot.index)
    }

    fn member_mut(&mut self, handle: Entity) -> Result<&mut Member, PoolError> {
        let member = self.slots.get(&handle).copied().and_then(|slot| {
            self.pools
                .get_mut(&slot.template)
                .and_then(|p| p.members.get_mut(slot.index))
        });

        match member {
            Some(m) => Ok(m),
            None => {
                error!("Tried to return {handle:?}, which is not owned by any pool.");
                Err(PoolError::InvalidHandleReturn { entity: handle })
            }
        }
    }
}

fn spawn_members<P: Prefab + ?Sized>(
    commands: &mut Commands,
    prefab: &P,
    container: Entity,
    pool: &mut Pool,
    slots: &mut HashMap<Entity, Slot>,
    count: usize,
) {
    let template = prefab.template();
    pool.members.reserve(count);

    for _ in 0..count {
        let index = pool.members.len();
        let mut entity = commands.spawn((
            Name::new(format!("{}_{index}", prefab.label())),
            PoolMember { template },
            Transform::default(),
            Visibility::Hidden,
            ChildOf(container),
        ));
        prefab.instantiate(&mut entity);
        let entity = entity.id();

        pool.members.push(Member {
            entity,
            active: false,
            generation: 0,
        });
        slots.insert(entity, Slot { template, index });
    }
}

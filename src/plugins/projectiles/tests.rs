//! Projectile client tests (Bevy 0.18 + Avian 0.5), deterministic.
//!
//! No physics pipeline runs here: collisions are injected as `CollisionStart` messages and
//! time moves by advancing `SimClock` by hand. Each system under test runs once via
//! `run_system_once`.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use super::components::{Bullet, FirePoint, Loadout, Shooter};
use super::templates::{BulletTemplate, BulletTemplates, ensure_bullet_pool};
use super::{ProjectileTimer, collision, commit, expiry, fire};
use crate::common::health::Health;
use crate::common::layers::Layer;
use crate::common::messages::FireInput;
use crate::common::test_utils::{run_system_once, with_commands_and};
use crate::common::tunables::Tunables;
use crate::plugins::pooling::{PoolRegistry, ReleaseOutcome, TemplateId};
use crate::plugins::timers::{DeferredQueue, SimClock};

// --------------------------------------------------------------------------------------
// Helpers
// --------------------------------------------------------------------------------------

const LIFETIME: Duration = Duration::from_secs(5);
const COOLDOWN: Duration = Duration::from_millis(500);

fn standard() -> BulletTemplate {
    BulletTemplate::default()
}

fn world_with_pool(size: usize) -> World {
    let mut world = World::new();
    world.insert_resource(PoolRegistry::new(10));
    world.init_resource::<SimClock>();
    world.init_resource::<DeferredQueue<ProjectileTimer>>();
    world.init_resource::<Messages<FireInput>>();
    world.init_resource::<Messages<CollisionStart>>();

    if size > 0 {
        with_commands_and::<PoolRegistry, _>(&mut world, |commands, registry| {
            registry.create_pool(commands, &standard(), size)
        })
        .unwrap();
    }
    world
}

fn spawn_shooter(world: &mut World) -> Entity {
    world
        .spawn((
            Shooter::new(COOLDOWN),
            Loadout::new(standard().id),
            FirePoint::default(),
            Transform::from_xyz(10.0, 20.0, 0.0),
        ))
        .id()
}

fn pull_trigger(world: &mut World, shooter: Entity) {
    world.write_message(FireInput { shooter });
    run_system_once(world, fire::fire_bullets);
    // Fresh readers start from the oldest buffered message.
    world.resource_mut::<Messages<FireInput>>().clear();
}

fn advance(world: &mut World, dt: Duration) {
    world.resource_mut::<SimClock>().advance(dt);
    run_system_once(world, expiry::run_projectile_timers);
    run_system_once(world, commit::commit_released_bullets);
}

fn members(world: &World) -> Vec<Entity> {
    world
        .resource::<PoolRegistry>()
        .members(standard().id)
        .collect()
}

fn active_count(world: &World) -> usize {
    let reg = world.resource::<PoolRegistry>();
    reg.members(standard().id)
        .filter(|e| reg.is_active(*e) == Some(true))
        .count()
}

fn is_active(world: &World, e: Entity) -> bool {
    world.resource::<PoolRegistry>().is_active(e) == Some(true)
}

fn set_ready(world: &mut World, shooter: Entity) {
    world.get_mut::<Shooter>(shooter).unwrap().ready = true;
}

fn spawn_meteorite(world: &mut World, hp: i32) -> Entity {
    world
        .spawn((
            Health::new(hp),
            CollisionLayers::new(Layer::Meteorite, [Layer::PlayerBullet, Layer::Player]),
        ))
        .id()
}

fn collide(world: &mut World, a: Entity, b: Entity) {
    world.write_message(CollisionStart {
        collider1: a,
        collider2: b,
        body1: Some(a),
        body2: Some(b),
    });
}

fn resolve_collisions(world: &mut World) {
    run_system_once(world, collision::resolve_bullet_collisions);
    world.resource_mut::<Messages<CollisionStart>>().clear();
}

fn assert_released_state(world: &World, e: Entity) {
    assert!(!is_active(world, e));
    assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Hidden);
    assert_eq!(world.get::<LinearVelocity>(e).unwrap().0, Vec2::ZERO);

    let layers = world.get::<CollisionLayers>(e).unwrap();
    assert!(layers.memberships.has_all(Layer::PlayerBullet));
    assert!(!layers.filters.has_all(Layer::World));
    assert!(!layers.filters.has_all(Layer::Meteorite));

    let bullet = world.get::<Bullet>(e).unwrap();
    assert!(bullet.lease.is_none());
    assert!(bullet.expiry.is_none());
}

// --------------------------------------------------------------------------------------
// Prefab / templates
// --------------------------------------------------------------------------------------

#[test]
fn pooled_bullets_start_inert() {
    let world = world_with_pool(4);

    for e in members(&world) {
        let layers = world.get::<CollisionLayers>(e).unwrap();
        assert!(layers.memberships.has_all(Layer::PlayerBullet));
        assert!(!layers.filters.has_all(Layer::World));
        assert!(!layers.filters.has_all(Layer::Meteorite));
        assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Hidden);
        assert!(world.get::<CollisionEventsEnabled>(e).is_some());
        assert!(world.get::<Sensor>(e).is_some());
    }
}

#[test]
fn ensure_bullet_pool_creates_once_at_default_size() {
    let mut world = world_with_pool(0);
    let templates = BulletTemplates::from_tunables(&Tunables::default());
    let heavy = TemplateId::new(1);

    let created = with_commands_and::<PoolRegistry, _>(&mut world, |commands, registry| {
        ensure_bullet_pool(registry, commands, &templates, heavy)
    });
    assert!(created);
    assert_eq!(world.resource::<PoolRegistry>().pool_size(heavy), Some(10));

    let again = with_commands_and::<PoolRegistry, _>(&mut world, |commands, registry| {
        ensure_bullet_pool(registry, commands, &templates, heavy)
    });
    assert!(again);
    assert_eq!(world.resource::<PoolRegistry>().pool_size(heavy), Some(10));
}

#[test]
fn ensure_bullet_pool_rejects_unknown_templates() {
    let mut world = world_with_pool(0);
    let templates = BulletTemplates::from_tunables(&Tunables::default());
    let unknown = TemplateId::new(99);

    let created = with_commands_and::<PoolRegistry, _>(&mut world, |commands, registry| {
        ensure_bullet_pool(registry, commands, &templates, unknown)
    });
    assert!(!created);
    assert!(!world.resource::<PoolRegistry>().pool_exists(unknown));
}

#[test]
fn duplicate_template_ids_keep_the_last_definition() {
    let mut tunables = Tunables::default();
    tunables.bullets = vec![
        BulletTemplate { name: "First".into(), ..standard() },
        BulletTemplate { name: "Second".into(), ..standard() },
    ];

    let templates = BulletTemplates::from_tunables(&tunables);
    assert_eq!(templates.get(standard().id).unwrap().name, "Second");
}

#[test]
fn loadout_equip_and_revert() {
    let base = TemplateId::new(0);
    let heavy = TemplateId::new(1);
    let mut loadout = Loadout::new(base);

    assert_eq!(loadout.equip(Some(heavy)), heavy);
    assert!(loadout.is_substituted());
    assert_eq!(loadout.equip(None), base);
    assert!(!loadout.is_substituted());

    loadout.equip(Some(heavy));
    assert_eq!(loadout.revert(), base);
}

// --------------------------------------------------------------------------------------
// Firing
// --------------------------------------------------------------------------------------

#[test]
fn firing_borrows_and_launches_from_the_fire_point() {
    let mut world = world_with_pool(3);
    let shooter = spawn_shooter(&mut world);

    pull_trigger(&mut world, shooter);

    // First inactive member in creation order.
    let e = members(&world)[0];
    assert!(is_active(&world, e));
    assert_eq!(active_count(&world), 1);

    let tf = world.get::<Transform>(e).unwrap();
    assert_eq!(tf.translation.truncate(), Vec2::new(10.0, 44.0));
    assert_eq!(world.get::<LinearVelocity>(e).unwrap().0, Vec2::new(0.0, 720.0));
    assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Visible);

    let layers = world.get::<CollisionLayers>(e).unwrap();
    assert!(layers.filters.has_all(Layer::World));
    assert!(layers.filters.has_all(Layer::Meteorite));

    let bullet = world.get::<Bullet>(e).unwrap();
    assert_eq!(bullet.damage, 1);
    let lease = bullet.lease.expect("lease recorded");
    assert_eq!(lease.entity(), e);
    let expiry = bullet.expiry.expect("expiry scheduled");
    assert!(world.resource::<DeferredQueue<ProjectileTimer>>().is_pending(expiry));

    // Expiry + cooldown.
    assert_eq!(world.resource::<DeferredQueue<ProjectileTimer>>().len(), 2);
    assert!(!world.get::<Shooter>(shooter).unwrap().ready);
}

#[test]
fn fire_direction_is_normalized() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);
    world.get_mut::<FirePoint>(shooter).unwrap().direction = Vec2::new(3.0, 0.0);

    pull_trigger(&mut world, shooter);

    let e = members(&world)[0];
    let vel = world.get::<LinearVelocity>(e).unwrap().0;
    assert!((vel - Vec2::new(720.0, 0.0)).length() < 1e-3);
}

#[test]
fn cooldown_gates_the_next_shot() {
    let mut world = world_with_pool(5);
    let shooter = spawn_shooter(&mut world);

    pull_trigger(&mut world, shooter);
    pull_trigger(&mut world, shooter);
    assert_eq!(active_count(&world), 1);

    advance(&mut world, COOLDOWN - Duration::from_millis(1));
    assert!(!world.get::<Shooter>(shooter).unwrap().ready);

    advance(&mut world, Duration::from_millis(1));
    assert!(world.get::<Shooter>(shooter).unwrap().ready);

    pull_trigger(&mut world, shooter);
    assert_eq!(active_count(&world), 2);
}

#[test]
fn exhausted_pool_fires_nothing() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);

    pull_trigger(&mut world, shooter);
    set_ready(&mut world, shooter);
    pull_trigger(&mut world, shooter);

    assert_eq!(active_count(&world), 1);
    // No shot, no cooldown.
    assert!(world.get::<Shooter>(shooter).unwrap().ready);
}

#[test]
fn missing_pool_fires_nothing() {
    let mut world = world_with_pool(0);
    let shooter = spawn_shooter(&mut world);

    pull_trigger(&mut world, shooter);

    assert!(world.resource::<DeferredQueue<ProjectileTimer>>().is_empty());
    assert!(world.get::<Shooter>(shooter).unwrap().ready);
}

#[test]
fn fire_input_from_a_non_shooter_is_ignored() {
    let mut world = world_with_pool(1);
    let stranger = world.spawn(Transform::default()).id();

    pull_trigger(&mut world, stranger);
    assert_eq!(active_count(&world), 0);
}

// --------------------------------------------------------------------------------------
// Expiry
// --------------------------------------------------------------------------------------

#[test]
fn bullets_expire_after_their_lifetime() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);
    pull_trigger(&mut world, shooter);
    let e = members(&world)[0];

    advance(&mut world, LIFETIME - Duration::from_millis(1));
    assert!(is_active(&world, e));

    advance(&mut world, Duration::from_millis(1));
    assert_released_state(&world, e);
}

// --------------------------------------------------------------------------------------
// Collisions (inject CollisionStart messages)
// --------------------------------------------------------------------------------------

#[test]
fn hitting_a_meteorite_deals_damage_and_releases() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);
    pull_trigger(&mut world, shooter);
    let e = members(&world)[0];
    let expiry = world.get::<Bullet>(e).unwrap().expiry.unwrap();

    let rock = spawn_meteorite(&mut world, 3);
    collide(&mut world, e, rock);
    resolve_collisions(&mut world);

    assert_eq!(world.get::<Health>(rock).unwrap().current(), 2);
    assert!(!is_active(&world, e));
    assert!(!world.resource::<DeferredQueue<ProjectileTimer>>().is_pending(expiry));

    run_system_once(&mut world, commit::commit_released_bullets);
    assert_released_state(&world, e);
}

#[test]
fn hitting_a_wall_releases_without_damage() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);
    pull_trigger(&mut world, shooter);
    let e = members(&world)[0];

    let wall = world
        .spawn(CollisionLayers::new(Layer::World, [Layer::PlayerBullet]))
        .id();
    // Bullet as the second participant.
    collide(&mut world, wall, e);
    resolve_collisions(&mut world);

    assert!(!is_active(&world, e));
}

#[test]
fn repeated_contacts_in_one_frame_count_once() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);
    pull_trigger(&mut world, shooter);
    let e = members(&world)[0];

    let rock = spawn_meteorite(&mut world, 3);
    collide(&mut world, e, rock);
    collide(&mut world, rock, e);
    resolve_collisions(&mut world);

    assert_eq!(world.get::<Health>(rock).unwrap().current(), 2);
}

#[test]
fn inactive_bullets_ignore_contacts() {
    let mut world = world_with_pool(1);
    let e = members(&world)[0];

    let rock = spawn_meteorite(&mut world, 3);
    collide(&mut world, e, rock);
    resolve_collisions(&mut world);

    assert_eq!(world.get::<Health>(rock).unwrap().current(), 3);
}

// --------------------------------------------------------------------------------------
// Cancel-on-early-return race
// --------------------------------------------------------------------------------------

#[test]
fn early_release_cancels_expiry_for_the_next_borrower() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);
    pull_trigger(&mut world, shooter);
    let e = members(&world)[0];

    // Hit something at D/2.
    advance(&mut world, LIFETIME / 2);
    let rock = spawn_meteorite(&mut world, 10);
    collide(&mut world, e, rock);
    resolve_collisions(&mut world);
    run_system_once(&mut world, commit::commit_released_bullets);
    assert!(!is_active(&world, e));

    // Same member goes out again before D.
    set_ready(&mut world, shooter);
    pull_trigger(&mut world, shooter);
    assert!(is_active(&world, e));

    // Past the first shot's deadline: the new borrower keeps flying.
    advance(&mut world, LIFETIME / 2 + Duration::from_millis(10));
    assert!(is_active(&world, e));
    assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Visible);

    // Its own lifetime still applies.
    advance(&mut world, LIFETIME / 2);
    assert_released_state(&world, e);
}

#[test]
fn stale_expiry_is_inert_even_without_cancellation() {
    let mut world = world_with_pool(1);
    let shooter = spawn_shooter(&mut world);
    pull_trigger(&mut world, shooter);
    let e = members(&world)[0];
    let first = world.get::<Bullet>(e).unwrap().lease.unwrap();

    // A forgotten timer for the first borrow.
    {
        let clock = *world.resource::<SimClock>();
        world
            .resource_mut::<DeferredQueue<ProjectileTimer>>()
            .schedule(&clock, LIFETIME, ProjectileTimer::Expire(first));
    }

    advance(&mut world, LIFETIME / 2);
    assert_eq!(
        world.resource_mut::<PoolRegistry>().release(e),
        Ok(ReleaseOutcome::Deactivated)
    );
    set_ready(&mut world, shooter);
    pull_trigger(&mut world, shooter);
    let second = world.get::<Bullet>(e).unwrap().lease.unwrap();
    assert_ne!(first.generation(), second.generation());

    advance(&mut world, LIFETIME / 2);
    assert!(is_active(&world, e));
    assert_eq!(world.get::<Bullet>(e).unwrap().lease, Some(second));
}

// --------------------------------------------------------------------------------------
// Commit
// --------------------------------------------------------------------------------------

#[test]
fn commit_cleans_up_after_release_all() {
    let mut world = world_with_pool(2);
    let shooter = spawn_shooter(&mut world);
    pull_trigger(&mut world, shooter);
    let e = members(&world)[0];
    let expiry = world.get::<Bullet>(e).unwrap().expiry.unwrap();

    assert_eq!(world.resource_mut::<PoolRegistry>().release_all(), 1);
    run_system_once(&mut world, commit::commit_released_bullets);

    assert_released_state(&world, e);
    assert!(!world.resource::<DeferredQueue<ProjectileTimer>>().is_pending(expiry));
}

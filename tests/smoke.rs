mod common;

use bevy::prelude::*;
use meteor_shooter::common::state::GameState;
use meteor_shooter::common::tunables::Tunables;
use meteor_shooter::plugins::pooling::PoolRegistry;

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();

    for _ in 0..3 {
        app.update();
    }

    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::InGame
    );
}

#[test]
fn entering_the_game_spawns_the_player_and_its_pool() {
    let mut app = common::app_headless();
    app.update();

    assert!(common::player(&mut app).is_some());

    let initial = app.world().resource::<Tunables>().initial_bullet;
    let registry = app.world().resource::<PoolRegistry>();
    assert_eq!(registry.pool_size(initial), Some(10));
    assert_eq!(registry.available(initial), Some(10));
}

#[test]
fn headless_app_uses_tunables_inserted_before_configuration() {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        bevy::state::app::StatesPlugin,
        bevy::asset::AssetPlugin::default(),
        bevy::scene::ScenePlugin,
    ));
    app.insert_resource(Tunables {
        default_pool_size: 4,
        ..default()
    });
    meteor_shooter::game::configure_headless(&mut app);
    app.finish();
    app.cleanup();
    app.update();

    let initial = app.world().resource::<Tunables>().initial_bullet;
    assert_eq!(
        app.world().resource::<PoolRegistry>().pool_size(initial),
        Some(4)
    );
}

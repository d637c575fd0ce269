//! End-to-end tests driving a character's animation layers.

use stagecraft::builder::{compile, CandidateConfig, DelayedConfig, StateConfig};
use stagecraft::core::{ActionError, ActionKind, Implementations, Trigger};
use stagecraft::machine::Machine;
use stagecraft::service::{Service, ServiceError};
use stagecraft::watch::{Clock, Lerp, WatchSet};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Character {
    moving: bool,
    airborne: bool,
    attacking: bool,
    animation_complete: bool,
    hits: Cell<u32>,
    played: RefCell<Vec<String>>,
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn lower_body() -> StateConfig {
    StateConfig::new("lower-body")
        .initial("idle")
        .state(
            StateConfig::new("idle")
                .entry("play")
                .on("tick", CandidateConfig::to("run").guard("moving?")),
        )
        .state(
            StateConfig::new("run")
                .entry("play")
                .on("tick", CandidateConfig::to("jump").guard("airborne?")),
        )
        .state(
            StateConfig::new("jump")
                .entry("play")
                .on("tick", CandidateConfig::to("idle").guard("landed?")),
        )
}

fn upper_body() -> StateConfig {
    StateConfig::new("upper-body")
        .initial("attack-idle")
        .state(
            StateConfig::new("attack-idle")
                .entry("play")
                .on("tick", CandidateConfig::to("attack-start").guard("attacking?")),
        )
        .state(
            StateConfig::new("attack-start")
                .entry("play")
                .after(DelayedConfig::new(ms(450), "attack-end").action("hit")),
        )
        .state(
            StateConfig::new("attack-end").entry("play").on(
                "tick",
                CandidateConfig::to("attack-idle").guard("animation-complete?"),
            ),
        )
}

fn character_config() -> StateConfig {
    StateConfig::new("character")
        .region(lower_body())
        .region(upper_body())
}

fn implementations() -> Implementations<Character> {
    Implementations::new()
        .guard("moving?", |c: &Character| c.moving)
        .guard("airborne?", |c: &Character| c.airborne)
        .guard("landed?", |c: &Character| !c.airborne)
        .guard("attacking?", |c: &Character| c.attacking)
        .guard("animation-complete?", |c: &Character| c.animation_complete)
        .action("play", |ctx| {
            ctx.context()
                .played
                .borrow_mut()
                .push(ctx.state().to_string());
            Ok(())
        })
        .action("hit", |ctx| {
            assert_eq!(ctx.kind(), ActionKind::Timer);
            let hits = &ctx.context().hits;
            hits.set(hits.get() + 1);
            Ok(())
        })
}

fn character_machine() -> Arc<Machine<Character>> {
    Arc::new(compile(&character_config(), &implementations()).unwrap())
}

fn started() -> Service<Character> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut service = Service::new(character_machine(), Character::default());
    service.start().unwrap();
    service
}

#[test]
fn start_enters_one_leaf_per_region() {
    let mut service = Service::new(character_machine(), Character::default());
    let configuration = service.start().unwrap();

    assert_eq!(
        configuration.leaves().collect::<Vec<_>>(),
        vec!["idle", "attack-idle"]
    );
    assert_eq!(*service.context().played.borrow(), vec!["idle", "attack-idle"]);
    assert_eq!(service.timers().len(), 0);
}

#[test]
fn attack_combo_leaves_lower_body_alone() {
    let mut service = started();

    service.context_mut().attacking = true;
    let configuration = service.send("tick").unwrap();
    assert_eq!(configuration.leaf("upper-body"), Some("attack-start"));
    assert_eq!(configuration.leaf("lower-body"), Some("idle"));

    let configuration = service.advance_time(ms(500)).unwrap();
    assert_eq!(configuration.leaf("upper-body"), Some("attack-end"));
    assert_eq!(service.context().hits.get(), 1);

    service.context_mut().attacking = false;
    service.context_mut().animation_complete = true;
    let configuration = service.send("tick").unwrap();
    assert_eq!(configuration.leaf("upper-body"), Some("attack-idle"));
    assert_eq!(configuration.leaf("lower-body"), Some("idle"));

    let lower_body_changes = service.history().for_region("lower-body").count();
    assert_eq!(lower_body_changes, 0);
    assert_eq!(service.history().for_region("upper-body").count(), 3);
}

#[test]
fn lower_body_cycles_on_its_guards() {
    let mut service = started();

    service.context_mut().moving = true;
    assert_eq!(service.send("tick").unwrap().leaf("lower-body"), Some("run"));

    service.context_mut().airborne = true;
    assert_eq!(service.send("tick").unwrap().leaf("lower-body"), Some("jump"));

    service.context_mut().airborne = false;
    assert_eq!(service.send("tick").unwrap().leaf("lower-body"), Some("idle"));
}

#[test]
fn delayed_transition_fires_exactly_at_deadline() {
    let mut service = started();
    service.context_mut().attacking = true;
    service.send("tick").unwrap();
    service.context_mut().attacking = false;

    let configuration = service.advance_time(ms(449)).unwrap();
    assert_eq!(configuration.leaf("upper-body"), Some("attack-start"));
    assert_eq!(service.context().hits.get(), 0);

    let configuration = service.advance_time(ms(450)).unwrap();
    assert_eq!(configuration.leaf("upper-body"), Some("attack-end"));
    assert_eq!(service.context().hits.get(), 1);

    service.advance_time(ms(5_000)).unwrap();
    assert_eq!(service.context().hits.get(), 1);

    let fired = service.history().last().unwrap();
    assert_eq!(fired.trigger, Trigger::Timer { delay: ms(450) });
    assert_eq!(fired.at, ms(450));
}

#[test]
fn timer_deadline_is_measured_from_entry() {
    let mut service = started();
    service.advance_time(ms(1_000)).unwrap();

    service.context_mut().attacking = true;
    service.send("tick").unwrap();

    assert_eq!(service.timers().next_deadline(), Some(ms(1_450)));
    service.advance_time(ms(1_449)).unwrap();
    assert_eq!(service.context().hits.get(), 0);
    service.advance_time(ms(1_450)).unwrap();
    assert_eq!(service.context().hits.get(), 1);
}

#[test]
fn exiting_a_state_cancels_its_timer() {
    let config = StateConfig::new("upper-body")
        .initial("attack-start")
        .state(
            StateConfig::new("attack-start")
                .after(DelayedConfig::new(ms(450), "attack-end").action("hit"))
                .on("flinch", CandidateConfig::to("stagger")),
        )
        .state(StateConfig::new("attack-end"))
        .state(StateConfig::new("stagger"));
    let machine = compile(&config, &implementations()).unwrap();
    let mut service = Service::new(Arc::new(machine), Character::default());
    service.start().unwrap();

    service.advance_time(ms(200)).unwrap();
    service.send("flinch").unwrap();
    assert!(service.timers().is_empty());

    let configuration = service.advance_time(ms(1_000)).unwrap();
    assert_eq!(configuration.leaf("upper-body"), Some("stagger"));
    assert_eq!(service.context().hits.get(), 0);
}

#[test]
fn first_declared_candidate_wins() {
    let config = StateConfig::new("stance")
        .initial("neutral")
        .state(
            StateConfig::new("neutral")
                .on("tick", CandidateConfig::to("guarding").guard("always?"))
                .on("tick", CandidateConfig::to("dodging").guard("always?"))
                .on("tick", CandidateConfig::to("parrying")),
        )
        .state(StateConfig::new("guarding"))
        .state(StateConfig::new("dodging"))
        .state(StateConfig::new("parrying"));
    let implementations = implementations().guard("always?", |_: &Character| true);
    let machine = Arc::new(compile(&config, &implementations).unwrap());

    for _ in 0..10 {
        let mut service = Service::new(Arc::clone(&machine), Character::default());
        service.start().unwrap();
        assert_eq!(service.send("tick").unwrap().leaf("stance"), Some("guarding"));
    }
}

#[test]
fn later_candidate_wins_when_earlier_guards_fail() {
    let config = StateConfig::new("stance")
        .initial("neutral")
        .state(
            StateConfig::new("neutral")
                .on("tick", CandidateConfig::to("guarding").guard("attacking?"))
                .on("tick", CandidateConfig::to("dodging").guard("moving?"))
                .on("tick", CandidateConfig::to("parrying")),
        )
        .state(StateConfig::new("guarding"))
        .state(StateConfig::new("dodging"))
        .state(StateConfig::new("parrying"));
    let machine = Arc::new(compile(&config, &implementations()).unwrap());

    let mut service = Service::new(Arc::clone(&machine), Character::default());
    service.start().unwrap();
    assert_eq!(service.send("tick").unwrap().leaf("stance"), Some("parrying"));

    let mut service = Service::new(machine, Character::default());
    service.context_mut().moving = true;
    service.start().unwrap();
    assert_eq!(service.send("tick").unwrap().leaf("stance"), Some("dodging"));
}

fn cycle(region: &str, event: &str, states: [&str; 3]) -> StateConfig {
    let mut config = StateConfig::new(region).initial(states[0]);
    for (i, state) in states.iter().enumerate() {
        let next = states[(i + 1) % states.len()];
        config = config.state(StateConfig::new(*state).on(event, CandidateConfig::to(next)));
    }
    config
}

#[test]
fn regions_advance_independently() {
    let config = StateConfig::new("pair")
        .region(cycle("left", "ping", ["a1", "a2", "a3"]))
        .region(cycle("right", "pong", ["b1", "b2", "b3"]));
    let machine = compile(&config, &Implementations::<()>::new()).unwrap();
    let mut service = Service::new(Arc::new(machine), ());
    service.start().unwrap();

    let configuration = service.send("ping").unwrap();
    assert_eq!(configuration.leaf("left"), Some("a2"));
    assert_eq!(configuration.leaf("right"), Some("b1"));

    service.send("ping").unwrap();
    service.send("ping").unwrap();
    let configuration = service.send("pong").unwrap();
    assert_eq!(configuration.leaf("left"), Some("a1"));
    assert_eq!(configuration.leaf("right"), Some("b2"));
}

#[test]
fn json_configuration_drives_the_same_scenario() {
    let json = r#"{
        "id": "character",
        "regions": [
            {
                "id": "upper-body",
                "initial": "attack-idle",
                "states": [
                    { "id": "attack-idle",
                      "on": { "tick": [{ "target": "attack-start", "guard": "attacking?" }] } },
                    { "id": "attack-start",
                      "after": [{ "delay": 450, "target": "attack-end", "actions": ["hit"] }] },
                    { "id": "attack-end" }
                ]
            }
        ]
    }"#;
    let config = StateConfig::from_json(json).unwrap();
    let machine = compile(&config, &implementations()).unwrap();
    let mut service = Service::new(Arc::new(machine), Character::default());
    service.start().unwrap();

    service.context_mut().attacking = true;
    service.send("tick").unwrap();
    let configuration = service.advance_time(ms(450)).unwrap();

    assert_eq!(configuration.leaf("upper-body"), Some("attack-end"));
    assert_eq!(service.context().hits.get(), 1);
}

#[test]
fn failing_action_aborts_the_send_and_keeps_the_region() {
    let config = StateConfig::new("character")
        .region(
            StateConfig::new("legs")
                .initial("idle")
                .state(StateConfig::new("idle").on("tick", CandidateConfig::to("run")))
                .state(StateConfig::new("run")),
        )
        .region(
            StateConfig::new("arms")
                .initial("rest")
                .state(StateConfig::new("rest").on("tick", CandidateConfig::to("swing")))
                .state(StateConfig::new("swing").entry("explode")),
        )
        .region(
            StateConfig::new("head")
                .initial("forward")
                .state(StateConfig::new("forward").on("tick", CandidateConfig::to("aside")))
                .state(StateConfig::new("aside")),
        );
    let implementations = implementations()
        .action("explode", |_| Err(ActionError::new("swing asset missing")));
    let machine = compile(&config, &implementations).unwrap();
    let mut service = Service::new(Arc::new(machine), Character::default());
    service.start().unwrap();

    let err = service.send("tick").unwrap_err();

    match err {
        ServiceError::ActionFailed {
            action,
            state,
            kind,
            source,
        } => {
            assert_eq!(action, "explode");
            assert_eq!(state, "character.arms.swing");
            assert_eq!(kind, ActionKind::Entry);
            assert_eq!(source.message(), "swing asset missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let configuration = service.configuration();
    assert_eq!(configuration.leaf("legs"), Some("run"));
    assert_eq!(configuration.leaf("arms"), Some("rest"));
    assert_eq!(configuration.leaf("head"), Some("forward"));
    assert!(service.is_running());
}

#[test]
fn raised_events_are_processed_after_the_current_send() {
    let config = StateConfig::new("character")
        .region(
            StateConfig::new("legs")
                .initial("idle")
                .state(
                    StateConfig::new("idle")
                        .on("tick", CandidateConfig::to("land").action("announce")),
                )
                .state(StateConfig::new("land")),
        )
        .region(
            StateConfig::new("camera")
                .initial("steady")
                .state(
                    StateConfig::new("steady")
                        .on("tick", CandidateConfig::targetless().action("note-tick"))
                        .on("landed", CandidateConfig::to("shake")),
                )
                .state(StateConfig::new("shake")),
        );
    let implementations = implementations()
        .action("announce", |ctx| {
            ctx.raise("landed");
            Ok(())
        })
        .action("note-tick", |ctx| {
            ctx.context().played.borrow_mut().push("tick".to_string());
            Ok(())
        });
    let machine = compile(&config, &implementations).unwrap();
    let mut service = Service::new(Arc::new(machine), Character::default());
    service.start().unwrap();

    let configuration = service.send("tick").unwrap();

    // camera handled the original tick before the raised event
    assert_eq!(*service.context().played.borrow(), vec!["tick"]);
    assert_eq!(configuration.leaf("camera"), Some("shake"));
    assert_eq!(configuration.leaf("legs"), Some("land"));
}

#[test]
fn teardown_releases_timers_and_watches() {
    let mut clock = Clock::new();
    let mut watches = WatchSet::new();
    let mut service = started();

    let blend = Rc::new(Cell::new(0.0));
    let sink = Rc::clone(&blend);
    let handle = Lerp::watch(&mut clock, ms(200), move |v| sink.set(v));
    watches.insert(handle.token());

    service.context_mut().attacking = true;
    service.send("tick").unwrap();
    clock.advance_by(ms(100));
    service.advance_time(clock.now()).unwrap();
    assert_eq!(blend.get(), 0.5);
    assert_eq!(service.timers().len(), 1);

    service.stop().unwrap();
    assert_eq!(watches.release_all(&mut clock), 1);

    assert!(service.timers().is_empty());
    assert_eq!(clock.watch_count(), 0);
    assert!(!handle.halt(&mut clock));
}

use std::sync::Arc;

use sgd_dst_loss::callosum::{DiagnosticsBus, FanoutObserver, LossEvent, LossObserver, TracingObserver};
use sgd_dst_loss::learning::{Reduction, SubTask};

#[test]
fn bus_delivers_to_every_subscriber() {
    let bus = DiagnosticsBus::new("test");
    let a = bus.subscribe("a");
    let b = bus.subscribe("b");

    let id = bus.publish(LossEvent::NoActiveLabels { task: SubTask::SpanEnd });

    for rx in [&a, &b] {
        let env = rx.recv().expect("did not receive event");
        assert_eq!(env.id, id);
        assert_eq!(env.source, "test");
        assert_eq!(env.event, LossEvent::NoActiveLabels { task: SubTask::SpanEnd });
    }
}

#[test]
fn ids_are_monotonic_and_dead_subscribers_are_dropped() {
    let bus = DiagnosticsBus::default();
    let rx = bus.subscribe("keep");
    drop(bus.subscribe("gone"));
    assert_eq!(bus.subscriber_count(), 2);

    let first = bus.publish(LossEvent::NoActiveLabels { task: SubTask::Intent });
    let second = bus.publish(LossEvent::NoActiveLabels { task: SubTask::CatSlotValue });
    assert!(second > first);
    assert_eq!(bus.subscriber_count(), 1);
    assert_eq!(rx.try_iter().count(), 2);

    bus.unsubscribe("keep");
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn bus_works_as_an_observer() {
    let bus = Arc::new(DiagnosticsBus::default());
    let rx = bus.subscribe("loss");
    let log: Arc<dyn LossObserver> = Arc::new(TracingObserver);
    let collect: Arc<dyn LossObserver> = bus.clone();
    let fanout = FanoutObserver::new(vec![log, collect]);

    let event = LossEvent::UnsupportedReduction { requested: "max".into(), fallback: Reduction::Mean };
    fanout.observe(&event);
    assert_eq!(rx.recv().expect("event").event, event);
}

#[test]
fn events_render_readable_messages() {
    let e = LossEvent::UnsupportedReduction { requested: "max".into(), fallback: Reduction::Mean };
    assert_eq!(e.to_string(), "max reduction is not supported. Setting reduction to \"mean\"");

    let e = LossEvent::NoActiveLabels { task: SubTask::CatSlotStatus };
    assert_eq!(e.to_string(), "no active labels for cat_slot_status_loss in the batch");
}

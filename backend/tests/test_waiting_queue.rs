//! WaitingQueue ordering tests, including property tests over arbitrary
//! enqueue/remove sequences

use clinic_simulator_core_rs::{Patient, Priority, WaitingQueue};
use proptest::prelude::*;

fn patient(id: &str, priority: Priority, specialty: &str, arrived: f64) -> Patient {
    Patient::new(id, priority, specialty).arrived_at(arrived)
}

#[test]
fn test_priority_order_with_fifo_ties() {
    let mut queue = WaitingQueue::new();
    queue.enqueue(patient("n1", Priority::Normal, "General", 0.0));
    queue.enqueue(patient("l1", Priority::Low, "General", 1.0));
    queue.enqueue(patient("u1", Priority::Urgent, "Cardiology", 2.0));
    queue.enqueue(patient("n2", Priority::Normal, "Cardiology", 3.0));
    queue.enqueue(patient("u2", Priority::Urgent, "General", 4.0));
    queue.enqueue(patient("h1", Priority::High, "General", 5.0));

    let ids: Vec<&str> = queue.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["u1", "u2", "h1", "n1", "n2", "l1"]);
}

#[test]
fn test_remove_keeps_order() {
    let mut queue = WaitingQueue::new();
    for (i, prio) in [Priority::Low, Priority::High, Priority::Normal, Priority::High]
        .into_iter()
        .enumerate()
    {
        queue.enqueue(patient(&format!("p{}", i), prio, "General", i as f64));
    }

    let removed = queue.remove_at(1).unwrap();
    assert_eq!(removed.id(), "p3");
    let ids: Vec<&str> = queue.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p0"]);

    assert!(queue.remove("missing").is_none());
    assert!(queue.remove_at(10).is_none());
}

#[test]
fn test_breakdowns() {
    let mut queue = WaitingQueue::new();
    queue.enqueue(patient("a", Priority::High, "Cardiology", 0.0));
    queue.enqueue(patient("b", Priority::High, "General", 2.0));
    queue.enqueue(patient("c", Priority::Low, "Cardiology", 4.0));

    let by_specialty = queue.count_by_specialty();
    assert_eq!(by_specialty.get("Cardiology"), Some(&2));
    assert_eq!(by_specialty.get("General"), Some(&1));
    assert_eq!(queue.count_priority(Priority::High), 2);
    assert!((queue.mean_wait(6.0) - 4.0).abs() < 1e-12);
}

#[test]
fn test_remove_where_returns_in_queue_order() {
    let mut queue = WaitingQueue::new();
    queue.enqueue(patient("a", Priority::Low, "General", 0.0));
    queue.enqueue(patient("b", Priority::Urgent, "General", 1.0));
    queue.enqueue(patient("c", Priority::Normal, "General", 2.0));

    let removed = queue.remove_where(|p| p.priority() != Priority::Normal);
    let ids: Vec<&str> = removed.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(queue.len(), 1);
}

#[derive(Debug, Clone)]
enum Op {
    Enqueue(u8),
    RemoveAt(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..4).prop_map(Op::Enqueue),
        1 => (0usize..20).prop_map(Op::RemoveAt),
    ]
}

fn priority_of(code: u8) -> Priority {
    match code {
        0 => Priority::Urgent,
        1 => Priority::High,
        2 => Priority::Normal,
        _ => Priority::Low,
    }
}

proptest! {
    #[test]
    fn prop_queue_stays_ordered(ops in prop::collection::vec(op(), 1..60)) {
        let mut queue = WaitingQueue::new();
        let mut next_id = 0usize;

        for op in ops {
            match op {
                Op::Enqueue(code) => {
                    queue.enqueue(patient(
                        &format!("p{:03}", next_id),
                        priority_of(code),
                        "General",
                        next_id as f64,
                    ));
                    next_id += 1;
                }
                Op::RemoveAt(i) => {
                    queue.remove_at(i);
                }
            }

            prop_assert!(queue.is_priority_ordered());
            // FIFO within a rank: ids were issued in arrival order
            for w in queue.as_slice().windows(2) {
                if w[0].priority() == w[1].priority() {
                    prop_assert!(w[0].id() < w[1].id());
                }
            }
        }
    }
}

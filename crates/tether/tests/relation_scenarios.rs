//! End-to-end scenarios for relations and sequences.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tether::{
    CollectionError, Items, ManyToMany, Position, RelationSide, SequenceEvent, SideKind, Slice,
    WatchableSequence, WeakCallback,
};
use tracing::{Level, info};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::TRACE)
        .try_init();
}

#[test]
fn set_to_list_walkthrough() {
    init_tracing();
    let rel: ManyToMany<u32, char> = ManyToMany::from_kinds("set", "list").unwrap();
    let one = rel.left().get_or_create(1);

    one.append('a').unwrap();
    assert!(rel.right().get(&'a').unwrap().contains(&1));

    one.remove(&'a').unwrap();
    assert!(rel.right().get(&'a').unwrap().is_empty());

    one.extend(['a', 'a']).unwrap();
    assert_eq!(one.items(), vec!['a']);
    assert_eq!(rel.right().get(&'a').unwrap().items(), vec![1]);
    info!(pairs = ?rel.pairs(), "walkthrough done");
}

#[test]
fn bulk_extend_notifies_after_everything_settles() {
    init_tracing();
    let rel = Rc::new(ManyToMany::<u32, u32>::new(SideKind::List, SideKind::Set));
    let snapshots = Rc::new(RefCell::new(Vec::new()));
    for key in 10..15 {
        let weak = Rc::downgrade(&rel);
        let snapshots = Rc::clone(&snapshots);
        rel.right().get_or_create(key).add_listener(move |side| {
            let Some(rel) = weak.upgrade() else { return };
            let mut pairs = rel.pairs();
            pairs.sort_unstable();
            snapshots.borrow_mut().push((*side.key(), pairs));
        });
    }

    rel.left().get_or_create(1).extend(10..15).unwrap();

    let full: Vec<(u32, u32)> = (10..15).map(|r| (1, r)).collect();
    let expected: Vec<_> = (10..15).map(|r| (r, full.clone())).collect();
    assert_eq!(*snapshots.borrow(), expected);
}

type Tag = &'static str;

fn recorder(
    order: &Rc<RefCell<Vec<Tag>>>,
    label: Tag,
) -> impl Fn(&RelationSide<Tag, Tag>) + 'static {
    let order = Rc::clone(order);
    move |_| order.borrow_mut().push(label)
}

#[test]
fn notification_order_is_self_then_touched_peers() {
    let rel: ManyToMany<&str, &str> = ManyToMany::new(SideKind::List, SideKind::List);
    let order = Rc::new(RefCell::new(Vec::new()));
    let post = rel.left().get_or_create("post");
    post.add_listener(recorder(&order, "post"));
    rel.right()
        .get_or_create("rust")
        .add_listener(recorder(&order, "rust"));
    rel.right().get_or_create("go").add_listener(recorder(&order, "go"));

    post.extend(["rust", "go", "rust"]).unwrap();
    assert_eq!(*order.borrow(), vec!["post", "rust", "go"]);
    assert_eq!(rel.right().get(&"rust").unwrap().items(), vec!["post", "post"]);
}

#[test]
fn set_reappend_is_silent() {
    let rel: ManyToMany<u32, u32> = ManyToMany::default();
    let side = rel.left().get_or_create(1);
    side.append(2).unwrap();

    let fired = Rc::new(Cell::new(0));
    for listener_side in [side.clone(), rel.right().get(&2).unwrap()] {
        let fired = Rc::clone(&fired);
        listener_side.add_listener(move |_| fired.set(fired.get() + 1));
    }

    side.append(2).unwrap();
    side.extend([2, 2]).unwrap();
    assert_eq!(fired.get(), 0);
    assert_eq!(side.len(), 1);
}

#[test]
fn checked_list_replace_with_repeat_keeps_the_repeat() {
    let rel: ManyToMany<u32, char> = ManyToMany::new(SideKind::CheckedList, SideKind::Set);
    let side = rel.left().get_or_create(1);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    side.add_listener(move |s| sink.borrow_mut().push(s.items()));

    let err = side.replace(Items::List(vec!['x', 'y', 'x'])).unwrap_err();
    assert_eq!(
        err,
        CollectionError::DuplicateKeys {
            operation: "replace".into(),
            values: vec!["'x'".into()],
        }
    );
    assert_eq!(side.items(), vec!['x', 'y', 'x']);
    assert_eq!(*seen.borrow(), vec![vec!['x', 'y', 'x']]);
    assert!(rel.is_symmetric());
}

#[test]
fn checked_list_peer_reports_link() {
    let rel: ManyToMany<u32, char> = ManyToMany::new(SideKind::List, SideKind::CheckedList);
    let err = rel.left().get_or_create(1).extend(['a', 'a']).unwrap_err();
    assert_eq!(
        err,
        CollectionError::DuplicateKeys {
            operation: "link".into(),
            values: vec!["1".into()],
        }
    );
    assert_eq!(rel.right().get(&'a').unwrap().items(), vec![1, 1]);
}

struct Tally {
    hits: Cell<usize>,
}

impl Tally {
    fn bump(&self, _side: &RelationSide<u32, u32>) {
        self.hits.set(self.hits.get() + 1);
    }
}

#[test]
fn weak_listener_goes_quietly() {
    let rel: ManyToMany<u32, u32> = ManyToMany::new(SideKind::List, SideKind::List);
    let side = rel.left().get_or_create(1);
    let owner = Rc::new(Tally { hits: Cell::new(0) });
    side.add_weak_listener(WeakCallback::new(&owner, Tally::bump));

    side.append(5).unwrap();
    assert_eq!(owner.hits.get(), 1);
    assert_eq!(side.listener_count(), 1);

    drop(owner);
    side.append(6).unwrap();
    side.append(7).unwrap();
    assert_eq!(side.listener_count(), 0);
    assert_eq!(side.items(), vec![5, 6, 7]);
}

#[test]
fn listener_may_mutate_the_relation() {
    let rel = Rc::new(ManyToMany::<u32, u32>::new(SideKind::Set, SideKind::Set));
    let weak = Rc::downgrade(&rel);
    rel.right().get_or_create(100).add_listener(move |side| {
        // Anything related to 100 is also related to 200.
        let Some(rel) = weak.upgrade() else { return };
        for key in side.items() {
            rel.left().get_or_create(key).append(200).unwrap();
        }
    });

    rel.left().get_or_create(1).append(100).unwrap();
    let mut related = rel.left().get(&1).unwrap().items();
    related.sort_unstable();
    assert_eq!(related, vec![100, 200]);
    assert!(rel.right().get(&200).unwrap().contains(&1));
}

#[test]
fn sides_outliving_the_relation_are_detached() {
    let rel: ManyToMany<u32, u32> = ManyToMany::default();
    let side = rel.left().get_or_create(1);
    side.append(2).unwrap();
    drop(rel);

    assert!(side.is_detached());
    assert!(matches!(side.append(3), Err(CollectionError::Detached { .. })));
    assert!(matches!(side.remove(&2), Err(CollectionError::Detached { .. })));
    assert_eq!(side.items(), vec![2]);
}

#[test]
fn counter_tracks_multiplicity() {
    let rel: ManyToMany<&str, &str> = ManyToMany::from_kinds("counter", "counter").unwrap();
    let basket = rel.left().get_or_create("basket");
    basket.extend(["apple", "apple", "pear"]).unwrap();
    assert_eq!(basket.count(&"apple"), 2);
    assert_eq!(basket.len(), 3);
    assert_eq!(rel.right().get(&"apple").unwrap().count(&"basket"), 2);

    basket
        .concat_in_place(&Items::collect(SideKind::Counter, ["pear"]))
        .unwrap();
    assert_eq!(rel.right().get(&"pear").unwrap().count(&"basket"), 2);

    basket
        .intersection_in_place(&Items::collect(SideKind::Counter, ["apple"]))
        .unwrap();
    assert_eq!(basket.items(), vec!["apple"]);
    assert!(rel.right().get(&"pear").unwrap().is_empty());
    assert_eq!(rel.right().get(&"apple").unwrap().count(&"basket"), 1);
}

#[test]
fn sequence_shrinking_slice_emits_update_then_delete() {
    let seq = WatchableSequence::from(vec![1, 2, 3, 4]);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let _sub = seq.subscribe(move |event: &SequenceEvent<i32>| {
        sink.borrow_mut().push(event.clone());
    });

    seq.set_slice(Slice::new(1, 3), [10]).unwrap();

    assert_eq!(seq.to_vec(), vec![1, 10, 4]);
    assert_eq!(
        *events.borrow(),
        vec![
            SequenceEvent::Update {
                position: Position::Slice(Slice::new(1, 2)),
                values: vec![10],
            },
            SequenceEvent::Delete {
                position: Position::Slice(Slice::new(2, 3)),
            },
        ]
    );
}

//! Integration test: anchored references survive storage relocation.
//!
//! Covers implicit moves (a `Vec` outgrowing its capacity), explicit
//! `Owner::relocate()` calls, projections into `Box` targets, and readers
//! running on other threads while the owner keeps moving.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use tether_ref::{Owner, ReadOnlyRef, Ref, RefError};
use tether_test_utils::{particles, Particle};

// ── Vec growth ──────────────────────────────────────────────────────

#[test]
fn element_refs_survive_vec_growth() {
    let owner = Owner::new(Vec::with_capacity(1)).into_shared();
    owner.push(0u32);

    let mut first: Ref<'_, u32> = Ref::element(&owner, 0).unwrap();
    first.set(41);

    for value in 1..10_000u32 {
        owner.push(value);
    }

    assert_eq!(first.replace(42), 41);
    assert_eq!(owner.read()[0], 42);
    assert_eq!(owner.len(), 10_000);
}

#[test]
fn refs_taken_mid_growth_stay_valid() {
    let owner = Owner::new(Vec::<u64>::new()).into_shared();
    let mut refs = Vec::new();
    for i in 0..256u64 {
        owner.push(i * i);
        refs.push(ReadOnlyRef::element(&owner, i as usize).unwrap());
        owner.reserve(i as usize);
    }
    for (i, r) in refs.iter().enumerate() {
        assert_eq!(r.get(), (i * i) as u64);
    }
}

#[test]
fn element_past_end_is_rejected() {
    let owner = Owner::new(vec![1u8, 2, 3]).into_shared();
    let err = Ref::element(&owner, 3).unwrap_err();
    assert_eq!(err, RefError::IndexOutOfBounds { index: 3, len: 3 });
}

// ── Explicit relocation ─────────────────────────────────────────────

#[test]
fn explicit_relocation_moves_and_counts() {
    let owner = Owner::new(particles(16)).into_shared();
    let mut tenth: Ref<'_, Particle> = Ref::element(&owner, 10).unwrap();

    for _ in 0..8 {
        owner.relocate();
    }
    assert_eq!(owner.relocations(), 8);

    tenth.write().mass = -1.0;
    assert_eq!(owner.read()[10].mass, -1.0);
    assert_eq!(tenth.offset(), Some(10 * std::mem::size_of::<Particle>()));
}

#[test]
fn field_projection_inside_boxed_record() {
    let owner = Owner::boxed(Particle::new(7)).into_shared();
    // SAFETY: `mass` is a plain field of the owner's target.
    let mut mass = unsafe { Ref::new(&owner, |p: &Particle| &p.mass) }.unwrap();
    // SAFETY: as above.
    let id = unsafe { ReadOnlyRef::new(&owner, |p: &Particle| &p.id) }.unwrap();

    owner.relocate();
    mass.set(99.5);
    owner.relocate();

    assert_eq!(owner.read().mass, 99.5);
    assert_eq!(id.get(), 7);
    assert_eq!(owner.relocations(), 2);
}

#[test]
fn projection_escaping_the_owner_is_rejected() {
    let owner = Owner::boxed(vec![1u32, 2, 3]).into_shared();
    // SAFETY: the projection is only bounds-checked here, never read.
    let result = unsafe { Ref::new(&owner, |v: &Vec<u32>| &v[1]) };
    assert!(matches!(result, Err(RefError::OutsideOwner { .. })));
}

#[test]
fn root_ref_follows_boxed_value() {
    let owner = Owner::boxed([0u16; 4]).into_shared();
    let mut whole: Ref<'_, [u16; 4], Box<[u16; 4]>> = Ref::root(&owner);
    whole.write()[2] = 5;
    owner.relocate();
    assert_eq!(whole.get(), [0, 0, 5, 0]);
    assert_eq!(whole.offset(), Some(0));
}

// ── Concurrency ─────────────────────────────────────────────────────

#[test]
fn readers_on_other_threads_while_owner_relocates() {
    let owner = Owner::new((0..64u32).map(|i| i * 3).collect::<Vec<_>>()).into_shared();

    std::thread::scope(|s| {
        for k in [0usize, 17, 40, 63] {
            let owner = &owner;
            s.spawn(move || {
                let r: ReadOnlyRef<'_, u32> = ReadOnlyRef::element(owner, k).unwrap();
                for _ in 0..2_000 {
                    assert_eq!(*r.read(), k as u32 * 3);
                }
            });
        }
        for round in 0..200u32 {
            owner.relocate();
            owner.extend([round; 4]);
        }
    });

    assert!(owner.relocations() >= 200);
    assert_eq!(owner.len(), 64 + 800);
}

#[test]
fn constructing_refs_while_holding_a_guard_with_relocation_queued() {
    let owner = Owner::new(vec![1u32, 2, 3]).into_shared();
    let (tx, rx) = mpsc::channel();

    let worker_owner = Arc::clone(&owner);
    std::thread::spawn(move || {
        let owner = worker_owner;
        let first: ReadOnlyRef<'_, u32> = ReadOnlyRef::element(&owner, 0).unwrap();
        let held = first.read();

        let mover = Arc::clone(&owner);
        let relocator = std::thread::spawn(move || mover.relocate());
        // Give the relocation time to queue behind `held`.
        std::thread::sleep(Duration::from_millis(100));

        let second: ReadOnlyRef<'_, u32> = ReadOnlyRef::element(&owner, 1).unwrap();
        // SAFETY: the projection lands on a plain element of the target.
        let third = unsafe { ReadOnlyRef::new(&owner, |v: &[u32]| &v[2]) }.unwrap();
        let sum = *held + second.get() + third.get() + owner.read()[2] + owner.len() as u32;
        assert!(owner.extent() >= 12);
        assert_ne!(owner.origin(), 0);

        drop(held);
        relocator.join().unwrap();
        let _ = tx.send(sum);
    });

    let sum = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("nested construction blocked behind a queued relocation");
    assert_eq!(sum, 1 + 2 + 3 + 3 + 3);
    assert_eq!(owner.relocations(), 1);
}

#[test]
fn refs_move_between_threads() {
    let owner = Owner::new(vec![0i64; 8]).into_shared();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let mut r: Ref<'static, i64> = Ref::element(&owner, i).unwrap();
            std::thread::spawn(move || r.set(-(i as i64)))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(&*owner.read(), &[0, -1, -2, -3, -4, -5, -6, -7]);
}

#[test]
fn direct_refs_alias_nothing_after_drop() {
    let mut value = Particle::new(3);
    {
        let mut r = Ref::direct(&mut value);
        assert!(!r.is_anchored());
        r.write().position = [9.0, 9.0, 9.0];
    }
    assert_eq!(value.position, [9.0, 9.0, 9.0]);
}

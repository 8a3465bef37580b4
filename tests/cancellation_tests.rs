use fnvshard::{CancelToken, Error, ShardMap};
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn filled(count: u32) -> ShardMap<u32, u32> {
    let map = ShardMap::with_shards(8).unwrap();
    for i in 0..count {
        map.store(i, i);
    }
    map
}

#[test]
fn test_uncancelled_token_behaves_like_plain_calls() {
    let map = filled(500);
    let token = CancelToken::new();

    assert_eq!(map.len_with(&token), Ok(500));

    let visits = AtomicUsize::new(0);
    map.range_with(&token, |_, _| {
        visits.fetch_add(1, Ordering::Relaxed);
    })
    .unwrap();
    assert_eq!(visits.into_inner(), 500);

    map.clear_with(&token).unwrap();
    assert!(map.is_empty());
}

#[test]
fn test_pre_cancelled_token_does_nothing() {
    let map = filled(500);
    let token = CancelToken::new();
    token.cancel();

    assert_eq!(map.len_with(&token), Err(Error::Cancelled));

    let visits = AtomicUsize::new(0);
    let result = map.range_with(&token, |_, _| {
        visits.fetch_add(1, Ordering::Relaxed);
    });
    assert_eq!(result, Err(Error::Cancelled));
    assert_eq!(visits.into_inner(), 0);

    assert_eq!(map.clear_with(&token), Err(Error::Cancelled));
    assert_eq!(map.len(), 500);
}

#[test]
fn test_cancel_from_inside_visitor() {
    let map = filled(1000);
    let token = CancelToken::new();
    let visits = AtomicUsize::new(0);

    let result = map.range_with(&token, |_, _| {
        if visits.fetch_add(1, Ordering::SeqCst) == 9 {
            token.cancel();
        }
    });

    assert_eq!(result, Err(Error::Cancelled));
    // Shards already mid-visit may each finish one more entry, no more.
    let visits = visits.into_inner();
    assert!(visits >= 10);
    assert!(visits < 1000);
}

/// A value that runs a hook when the map drops it.
///
/// `clear` drops values while holding the shard's write lock, so the hook
/// runs inside the fan-out, on the task clearing that shard.
struct Payload {
    on_drop: Option<Box<dyn Fn() + Send + Sync>>,
}

impl Payload {
    fn plain() -> Self {
        Self { on_drop: None }
    }

    fn with_hook(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            on_drop: Some(Box::new(hook)),
        }
    }
}

impl Drop for Payload {
    fn drop(&mut self) {
        if let Some(hook) = &self.on_drop {
            hook();
        }
    }
}

/// 64 shards, every one populated, plus the key of some entry in shard 0.
fn filled_with_payloads() -> (ShardMap<u32, Payload>, u32) {
    let map = ShardMap::with_shards(64).unwrap();
    for i in 0..6400u32 {
        map.store(i, Payload::plain());
    }
    let first_shard_key = (0..6400u32).find(|key| map.shard_for(key) == 0).unwrap();
    (map, first_shard_key)
}

fn single_thread_pool() -> rayon::ThreadPool {
    ThreadPoolBuilder::new().num_threads(1).build().unwrap()
}

fn assert_each_shard_whole(after: &[usize], before: &[usize]) {
    assert_eq!(after.len(), before.len());
    for (index, (load, original)) in after.iter().zip(before).enumerate() {
        assert!(
            *load == 0 || load == original,
            "shard {} partially cleared: {} of {}",
            index,
            load,
            original
        );
    }
    assert!(after.iter().any(|&load| load == 0), "no shard was cleared");
    assert!(
        after.iter().zip(before).any(|(load, original)| load == original),
        "every shard was cleared"
    );
}

#[test]
fn test_clear_cancelled_mid_fan_out_leaves_shards_whole() {
    let (map, first_shard_key) = filled_with_payloads();
    let token = CancelToken::new();

    // Clearing shard 0 drops this value, which cancels the rest of the clear.
    let trigger = token.clone();
    map.store(first_shard_key, Payload::with_hook(move || trigger.cancel()));
    let before = map.shard_loads();
    assert!(before.iter().all(|&load| load > 0));

    // One worker visits shards in index order, so shard 0 goes first.
    let pool = single_thread_pool();
    let result = pool.install(|| map.clear_with(&token));

    assert_eq!(result, Err(Error::Cancelled));
    let after = map.shard_loads();
    assert_eq!(after[0], 0);
    assert_each_shard_whole(&after, &before);
}

#[test]
fn test_len_cancelled_while_waiting_on_a_shard() {
    let (map, first_shard_key) = filled_with_payloads();
    let map = Arc::new(map);
    let clear_token = CancelToken::new();
    let len_token = CancelToken::new();
    let locked = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));

    // While shard 0 is being cleared, its write lock is held until `release`.
    // The clear cancels itself there, so only shard 0 ends up cleared.
    let hook = {
        let clear_token = clear_token.clone();
        let locked = Arc::clone(&locked);
        let release = Arc::clone(&release);
        move || {
            clear_token.cancel();
            locked.wait();
            release.wait();
        }
    };
    map.store(first_shard_key, Payload::with_hook(hook));
    let before = map.shard_loads();

    let clearer = {
        let map = Arc::clone(&map);
        let clear_token = clear_token.clone();
        thread::spawn(move || single_thread_pool().install(|| map.clear_with(&clear_token)))
    };
    locked.wait();

    // Cancel the count while it is stuck behind shard 0, then let it through.
    let canceller = {
        let len_token = len_token.clone();
        let release = Arc::clone(&release);
        thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(20));
            len_token.cancel();
            release.wait();
        })
    };

    let counted = single_thread_pool().install(|| map.len_with(&len_token));
    assert_eq!(counted, Err(Error::Cancelled));

    canceller.join().unwrap();
    assert_eq!(clearer.join().unwrap(), Err(Error::Cancelled));

    let after = map.shard_loads();
    assert_eq!(after[0], 0);
    assert_each_shard_whole(&after, &before);
    assert_eq!(map.len(), before.iter().sum::<usize>() - before[0]);
}

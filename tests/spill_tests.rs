use std::fs;

use patience::solver::spill::{read_frame, write_frame};
use patience::solver::{
    Checkpoint, CheckpointStore, DedupTable, MemoryStack, SpillCompression, SpillStack,
};
use patience::{DedupKey, FreecellMove, SpillError};

fn checkpoint(tag: u8) -> Checkpoint<FreecellMove> {
    let mut seen = DedupTable::new();
    seen.insert(DedupKey::new(u32::from(tag), 7));
    seen.insert(DedupKey::new(1, u128::MAX - u128::from(tag)));
    Checkpoint {
        frontier: (0..40u8)
            .map(|i| vec![FreecellMove::from_code(i % 64); usize::from(tag) + 1])
            .collect(),
        seen,
    }
}

#[test]
fn frames_round_trip_with_each_compression() {
    let dir = tempfile::tempdir().unwrap();
    for (i, comp) in [SpillCompression::None, SpillCompression::Lz4].into_iter().enumerate() {
        let path = dir.path().join(format!("frame-{i}"));
        let cp = checkpoint(3);
        write_frame(&path, &cp, comp).unwrap();
        let back: Checkpoint<FreecellMove> = read_frame(&path).unwrap();
        assert_eq!(back, cp);
    }
}

#[test]
fn flipped_payload_byte_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame");
    write_frame(&path, &checkpoint(5), SpillCompression::None).unwrap();
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x40;
    fs::write(&path, &bytes).unwrap();
    match read_frame::<Checkpoint<FreecellMove>>(&path) {
        Err(SpillError::Corrupt { reason, .. }) => assert!(reason.contains("crc"), "{reason}"),
        other => panic!("expected a crc failure, got {other:?}"),
    }
}

#[test]
fn truncated_and_foreign_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame");
    write_frame(&path, &checkpoint(1), SpillCompression::Lz4).unwrap();
    let bytes = fs::read(&path).unwrap();

    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
    assert!(matches!(
        read_frame::<Checkpoint<FreecellMove>>(&path),
        Err(SpillError::Corrupt { .. })
    ));

    fs::write(&path, &bytes[..10]).unwrap();
    assert!(matches!(
        read_frame::<Checkpoint<FreecellMove>>(&path),
        Err(SpillError::Corrupt { .. })
    ));

    let mut foreign = bytes.clone();
    foreign[..8].copy_from_slice(b"NOTSPILL");
    fs::write(&path, &foreign).unwrap();
    match read_frame::<Checkpoint<FreecellMove>>(&path) {
        Err(SpillError::Corrupt { reason, .. }) => assert!(reason.contains("magic")),
        other => panic!("expected bad magic, got {other:?}"),
    }

    let mut oversized = bytes.clone();
    oversized[13..21].copy_from_slice(&(1u64 << 62).to_le_bytes());
    fs::write(&path, &oversized).unwrap();
    match read_frame::<Checkpoint<FreecellMove>>(&path) {
        Err(SpillError::Corrupt { reason, .. }) => {
            assert!(reason.contains("impossible"), "{reason}")
        }
        other => panic!("expected an impossible length, got {other:?}"),
    }

    let mut future = bytes;
    future[8] = 99;
    fs::write(&path, &future).unwrap();
    match read_frame::<Checkpoint<FreecellMove>>(&path) {
        Err(SpillError::Corrupt { reason, .. }) => assert!(reason.contains("version")),
        other => panic!("expected a version mismatch, got {other:?}"),
    }

    let missing = dir.path().join("missing");
    assert!(matches!(
        read_frame::<Checkpoint<FreecellMove>>(&missing),
        Err(SpillError::Io { .. })
    ));
}

#[test]
fn spill_stack_is_lifo_and_removes_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut stack = SpillStack::<FreecellMove>::create(dir.path().join("cp"), SpillCompression::Lz4)
        .unwrap();
    assert!(stack.is_empty());
    for tag in 0..3 {
        stack.push(checkpoint(tag)).unwrap();
    }
    assert_eq!(stack.len(), 3);
    assert!(stack.paths().iter().all(|p| p.exists()));

    let top = stack.pop().unwrap().unwrap();
    assert_eq!(top, checkpoint(2));
    assert_eq!(stack.len(), 2);
    assert_eq!(fs::read_dir(stack.dir()).unwrap().count(), 2);

    let spill_dir = stack.dir().to_path_buf();
    drop(stack);
    assert_eq!(fs::read_dir(&spill_dir).unwrap().count(), 0);
}

#[test]
fn spill_stack_reports_corruption_on_pop() {
    let dir = tempfile::tempdir().unwrap();
    let mut stack =
        SpillStack::<FreecellMove>::create(dir.path().join("cp"), SpillCompression::None).unwrap();
    stack.push(checkpoint(4)).unwrap();
    let path = stack.paths()[0].clone();
    let mut bytes = fs::read(&path).unwrap();
    let mid = bytes.len() / 2 + 20;
    bytes[mid] ^= 0xFF;
    fs::write(&path, bytes).unwrap();
    assert!(matches!(stack.pop(), Err(SpillError::Corrupt { .. })));

    // The unreadable file is still tracked and goes away with the stack.
    assert_eq!(stack.len(), 1);
    assert!(path.exists());
    let spill_dir = stack.dir().to_path_buf();
    drop(stack);
    assert_eq!(fs::read_dir(&spill_dir).unwrap().count(), 0);
}

#[test]
fn memory_stack_is_lifo() {
    let mut stack = MemoryStack::new();
    stack.push(checkpoint(0)).unwrap();
    stack.push(checkpoint(1)).unwrap();
    assert_eq!(stack.deferred_sequences(), 80);
    assert_eq!(stack.pop().unwrap(), Some(checkpoint(1)));
    assert_eq!(stack.pop().unwrap(), Some(checkpoint(0)));
    assert_eq!(stack.pop().unwrap(), None);
    assert!(stack.is_empty());
}

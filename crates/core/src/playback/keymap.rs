/// Operations a key press can invoke on the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerCommand {
    TogglePlay,
    ToggleRecord,
    ToggleWaitForFrames,
    ToggleDiscardStaleFrames,
    Skip(i64),
    RecordOneFrame,
    ToggleStream(usize),
    SnapshotStream(usize),
}

/// Frames skipped by the coarse skip keys (`<` / `>`).
pub const FRAME_SKIP: i64 = 30;

const SNAPSHOT_KEYS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*', '('];

/// The static key-to-operation map, built once at startup and shared by
/// every frontend so shortcuts behave identically everywhere.
pub fn command_for_key(key: char) -> Option<ViewerCommand> {
    match key {
        ' ' => Some(ViewerCommand::TogglePlay),
        'r' => Some(ViewerCommand::ToggleRecord),
        'w' => Some(ViewerCommand::ToggleWaitForFrames),
        'd' => Some(ViewerCommand::ToggleDiscardStaleFrames),
        ',' => Some(ViewerCommand::Skip(-1)),
        '.' => Some(ViewerCommand::Skip(1)),
        '<' => Some(ViewerCommand::Skip(-FRAME_SKIP)),
        '>' => Some(ViewerCommand::Skip(FRAME_SKIP)),
        '0' => Some(ViewerCommand::RecordOneFrame),
        '1'..='9' => Some(ViewerCommand::ToggleStream(key as usize - '1' as usize)),
        _ => SNAPSHOT_KEYS
            .iter()
            .position(|&k| k == key)
            .map(ViewerCommand::SnapshotStream),
    }
}

/// Selection movement in the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// What a key press asks the top view to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Navigate(Direction),
    ToggleHelp,
    CycleSortMode,
    /// Stop or resume periodic polling; an explicit refresh still works.
    TogglePause,
    Refresh,
    None,
}

use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Quit,
    /// Relative horizon change in minutes.
    AdjustHorizon(i64),
    TypeDigit(u8),
    EraseDigit,
    SubmitHorizon,
    CancelEdit,
    NextTab,
    PrevTab,
    ScrollUp,
    ScrollDown,
}

pub fn parse_command(key_code: &KeyCode) -> Option<UiCommand> {
    match key_code {
        KeyCode::Up => Some(UiCommand::AdjustHorizon(1)),
        KeyCode::Down => Some(UiCommand::AdjustHorizon(-1)),
        KeyCode::PageUp => Some(UiCommand::AdjustHorizon(60)),
        KeyCode::PageDown => Some(UiCommand::AdjustHorizon(-60)),
        KeyCode::Backspace => Some(UiCommand::EraseDigit),
        KeyCode::Enter => Some(UiCommand::SubmitHorizon),
        KeyCode::Esc => Some(UiCommand::CancelEdit),
        KeyCode::Tab => Some(UiCommand::NextTab),
        KeyCode::BackTab => Some(UiCommand::PrevTab),
        KeyCode::Char(c) if c.is_ascii_digit() => Some(UiCommand::TypeDigit(*c as u8 - b'0')),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'q' => Some(UiCommand::Quit),
            '+' | '=' => Some(UiCommand::AdjustHorizon(1)),
            '-' | '_' => Some(UiCommand::AdjustHorizon(-1)),
            'j' => Some(UiCommand::ScrollDown),
            'k' => Some(UiCommand::ScrollUp),
            _ => None,
        },
        _ => None,
    }
}

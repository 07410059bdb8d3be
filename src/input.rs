use crate::config::ConfigCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

const ORBIT_STEP: f32 = 0.1;
const DISTANCE_STEP: f32 = 0.25;
const SCALE_STEP: f32 = 0.05;
const OFFSET_STEP: f32 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    Adjust(ConfigCommand),
    Diagnostic,
    Resized(u16, u16),
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        out.push(event::read()?);
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event(ev: Event, debug_open: bool) -> Option<Action> {
    match ev {
        Event::Key(k) if matches!(k.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
            map_key(k, debug_open)
        }
        Event::Resize(c, r) => Some(Action::Resized(c, r)),
        _ => None,
    }
}

pub(crate) fn map_key(k: KeyEvent, debug_open: bool) -> Option<Action> {
    use ConfigCommand::*;

    let adjust = |cmd| Some(Action::Adjust(cmd));

    if k.modifiers.contains(KeyModifiers::CONTROL) {
        return match k.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    if k.modifiers.contains(KeyModifiers::SHIFT) {
        let nudge = |dx, dy| adjust(NudgeGlobeOffset { dx, dy });
        match k.code {
            KeyCode::Up => return nudge(0.0, OFFSET_STEP),
            KeyCode::Down => return nudge(0.0, -OFFSET_STEP),
            KeyCode::Left => return nudge(-OFFSET_STEP, 0.0),
            KeyCode::Right => return nudge(OFFSET_STEP, 0.0),
            _ => {}
        }
    }

    match k.code {
        // Esc only ever closes the debug panel
        KeyCode::Esc => debug_open.then_some(Action::Adjust(ToggleDebug)),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char(' ') => adjust(TogglePause),
        KeyCode::Char('m') => adjust(ToggleMovement),
        KeyCode::Char('r') => adjust(ToggleRotation),
        KeyCode::Char('p') | KeyCode::Char('P') => adjust(ToggleTestPattern),
        KeyCode::Char('n') => adjust(NextPatternKind),
        KeyCode::Char(',') => adjust(NudgePatternSpacing(-1)),
        KeyCode::Char('.') => adjust(NudgePatternSpacing(1)),
        KeyCode::Char('d') | KeyCode::Char('D') => adjust(ToggleDebug),
        KeyCode::Char('t') | KeyCode::Char('T') => Some(Action::Diagnostic),
        KeyCode::Char('l') => adjust(ToggleLightMode),
        KeyCode::Char('f') => adjust(ToggleFlipped),
        KeyCode::Up => adjust(NudgeOrbit { dx: ORBIT_STEP, dy: 0.0 }),
        KeyCode::Down => adjust(NudgeOrbit { dx: -ORBIT_STEP, dy: 0.0 }),
        KeyCode::Left => adjust(NudgeOrbit { dx: 0.0, dy: -ORBIT_STEP }),
        KeyCode::Right => adjust(NudgeOrbit { dx: 0.0, dy: ORBIT_STEP }),
        KeyCode::Char('+') | KeyCode::Char('=') => adjust(NudgeCameraDistance(-DISTANCE_STEP)),
        KeyCode::Char('-') => adjust(NudgeCameraDistance(DISTANCE_STEP)),
        KeyCode::Char('[') => adjust(NudgeGlobeScale(-SCALE_STEP)),
        KeyCode::Char(']') => adjust(NudgeGlobeScale(SCALE_STEP)),
        _ => None,
    }
}

pub(crate) const KEY_HINT: &str =
    "q quit | space pause | p pattern | n kind | ,. spacing | d debug | l sun/moon | arrows orbit | +- zoom | [] scale";

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: KeyCode) -> KeyEvent {
        KeyEvent::new(c, KeyModifiers::NONE)
    }

    #[test]
    fn space_pauses_everything() {
        assert_eq!(
            map_key(key(KeyCode::Char(' ')), false),
            Some(Action::Adjust(ConfigCommand::TogglePause))
        );
    }

    #[test]
    fn arrows_orbit_the_camera() {
        assert_eq!(
            map_key(key(KeyCode::Left), false),
            Some(Action::Adjust(ConfigCommand::NudgeOrbit {
                dx: 0.0,
                dy: -ORBIT_STEP
            }))
        );
        assert_eq!(
            map_key(key(KeyCode::Up), false),
            Some(Action::Adjust(ConfigCommand::NudgeOrbit {
                dx: ORBIT_STEP,
                dy: 0.0
            }))
        );
    }

    #[test]
    fn shifted_arrows_move_the_globe() {
        let k = KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT);
        assert_eq!(
            map_key(k, false),
            Some(Action::Adjust(ConfigCommand::NudgeGlobeOffset {
                dx: OFFSET_STEP,
                dy: 0.0
            }))
        );
    }

    #[test]
    fn control_c_quits() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl('c'), false), Some(Action::Quit));
        assert_eq!(map_key(ctrl('p'), false), None);
    }

    #[test]
    fn capital_s_is_unbound() {
        let k = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert_eq!(map_key(k, false), None);
    }

    #[test]
    fn resize_and_release_events() {
        assert_eq!(map_event(Event::Resize(80, 24), false), Some(Action::Resized(80, 24)));
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(map_event(Event::Key(release), false), None);
        assert_eq!(map_event(Event::Key(key(KeyCode::Char('q'))), false), Some(Action::Quit));
    }

    #[test]
    fn escape_only_closes_the_debug_panel() {
        assert_eq!(map_key(key(KeyCode::Esc), false), None);
        assert_eq!(
            map_key(key(KeyCode::Esc), true),
            Some(Action::Adjust(ConfigCommand::ToggleDebug))
        );
    }
}

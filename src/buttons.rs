use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use log::{debug, info};

use crate::triggers::TriggerFlags;

/// The two frame buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Next account.
    A,
    /// Next post.
    B,
}

impl Button {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "a" | "A" => Some(Button::A),
            "b" | "B" => Some(Button::B),
            _ => None,
        }
    }
}

/// Press callback, safe to call from any thread.
pub fn press(flags: &TriggerFlags, button: Button) {
    match button {
        Button::A => {
            info!("Account trigger fired");
            flags.request_account_change();
        }
        Button::B => {
            info!("Post trigger fired");
            flags.request_post_change();
        }
    }
}

/// Reads `a`/`b` lines on a background thread and turns them into presses.
/// Stops at end of input.
pub fn spawn_line_reader<R>(reader: R, flags: Arc<TriggerFlags>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            match Button::from_key(&line) {
                Some(button) => press(&flags, button),
                None => debug!("ignoring button input {line:?}"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::PostStep;
    use std::io::Cursor;

    #[test]
    fn keys_map_to_buttons() {
        assert_eq!(Button::from_key("a"), Some(Button::A));
        assert_eq!(Button::from_key(" B \n"), Some(Button::B));
        assert_eq!(Button::from_key("c"), None);
    }

    #[test]
    fn line_reader_presses_buttons() {
        let flags = Arc::new(TriggerFlags::new());
        let input = Cursor::new("b\nnoise\n");
        spawn_line_reader(input, flags.clone()).join().unwrap();
        assert!(!flags.take_account_change());
        assert_eq!(flags.take_post_change(), Some(PostStep::Next));

        let input = Cursor::new("a\n");
        spawn_line_reader(input, flags.clone()).join().unwrap();
        assert!(flags.take_account_change());
        assert_eq!(flags.take_post_change(), Some(PostStep::First));
    }
}

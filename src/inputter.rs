use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Line editor for the filter input fields. Enter finishes, Esc cancels.
#[derive(Default)]
pub struct Inputter {
    value: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.finished = true,
            (KeyCode::Esc, KeyModifiers::NONE) => {
                self.value.clear();
                self.curser_pos = 0;
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.curser_pos = self.curser_pos.saturating_sub(1);
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.curser_pos < self.value.chars().count() {
                    self.curser_pos += 1;
                }
            }
            (code, _) => {
                if let Some(chr) = code.as_char() {
                    self.value.insert(self.byte_pos(), chr);
                    self.curser_pos += 1;
                }
            }
        }
        self.get()
    }

    /// Pre-fill the editor, e.g. when re-editing an applied filter.
    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.curser_pos = self.value.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.value.clone(),
            finished: self.finished,
            canceled: self.canceled,
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.curser_pos = 0;
        self.finished = false;
        self.canceled = false;
    }

    fn backspace(&mut self) {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let pos = self.byte_pos();
            self.value.remove(pos);
        }
    }

    fn byte_pos(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.value.len())
    }
}

/// Field of the manual event-entry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Date,
    Time,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventForm {
    pub title: String,
    pub date: String,
    pub time: String,
    pub description: String,
}

/// A validated form submission: trimmed title and description, date as
/// `YYYY-MM-DD`, time as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEvent {
    pub title: String,
    pub date: String,
    pub time: String,
    pub description: String,
}

impl EventForm {
    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Title => self.title = value,
            FormField::Date => self.date = value,
            FormField::Time => self.time = value,
            FormField::Description => self.description = value,
        }
    }

    /// Submit is enabled only when every required field has content.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.date.trim().is_empty()
            && !self.time.trim().is_empty()
    }

    pub fn to_event(&self) -> Option<ManualEvent> {
        if !self.is_valid() {
            return None;
        }
        Some(ManualEvent {
            title: self.title.trim().to_string(),
            date: self.date.trim().to_string(),
            time: self.time.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

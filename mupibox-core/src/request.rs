use serde::{Deserialize, Serialize};

/// Raw fields of the admin form, exactly as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminForm {
    #[serde(default)]
    pub activate_the_hat: Option<String>,
    #[serde(default)]
    pub mupihat_active: Option<String>,
    #[serde(default)]
    pub save_battery: Option<String>,
    #[serde(default)]
    pub battery: Option<String>,
}

/// A normalized user intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    SetHatActive(bool),
    SetSelectedBattery(String),
}

impl AdminForm {
    /// Build from decoded key/value pairs. Unknown keys are ignored and the
    /// last occurrence of a repeated key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut form = AdminForm::default();
        for (k, v) in pairs {
            let slot = match k.as_ref() {
                "activate_the_hat" => &mut form.activate_the_hat,
                "mupihat_active" => &mut form.mupihat_active,
                "save_battery" => &mut form.save_battery,
                "battery" => &mut form.battery,
                _ => continue,
            };
            *slot = Some(v.into());
        }
        form
    }

    /// Normalize presence-style fields into intents, hat first.
    pub fn into_intents(self) -> Vec<Intent> {
        let mut intents = Vec::new();
        if is_set(self.activate_the_hat.as_deref()) {
            intents.push(Intent::SetHatActive(is_set(self.mupihat_active.as_deref())));
        }
        if is_set(self.save_battery.as_deref()) {
            intents.push(Intent::SetSelectedBattery(self.battery.unwrap_or_default()));
        }
        intents
    }
}

// A posted field counts when it is present, non-empty and not "0".
fn is_set(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_form_has_no_intents() {
        assert!(AdminForm::default().into_intents().is_empty());
    }

    #[test]
    fn unchecked_box_means_disable() {
        let form = AdminForm::from_pairs([("activate_the_hat", "Save")]);
        assert_eq!(form.into_intents(), vec![Intent::SetHatActive(false)]);

        let form = AdminForm::from_pairs([("activate_the_hat", "Save"), ("mupihat_active", "0")]);
        assert_eq!(form.into_intents(), vec![Intent::SetHatActive(false)]);
    }

    #[test]
    fn checked_box_means_enable() {
        let form = AdminForm::from_pairs([("mupihat_active", "on"), ("activate_the_hat", "Save")]);
        assert_eq!(form.into_intents(), vec![Intent::SetHatActive(true)]);
    }

    #[test]
    fn battery_field_alone_is_not_an_intent() {
        let form = AdminForm::from_pairs([("battery", "Custom")]);
        assert!(form.into_intents().is_empty());
    }

    #[test]
    fn both_intents_keep_hat_first() {
        let form = AdminForm::from_pairs([
            ("save_battery", "Save"),
            ("battery", "Custom"),
            ("activate_the_hat", "Save"),
            ("mupihat_active", "on"),
            ("unrelated", "x"),
        ]);
        assert_eq!(
            form.into_intents(),
            vec![
                Intent::SetHatActive(true),
                Intent::SetSelectedBattery("Custom".into())
            ]
        );
    }
}

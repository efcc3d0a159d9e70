use mupibox_core::request::AdminForm;

/// Decode an `application/x-www-form-urlencoded` body.
pub fn parse_form(body: &str) -> AdminForm {
    let pairs = url::form_urlencoded::parse(body.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()));
    AdminForm::from_pairs(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mupibox_core::request::Intent;

    #[test]
    fn decodes_checkbox_submit() {
        let form = parse_form("mupihat_active=on&activate_the_hat=Save");
        assert_eq!(form.into_intents(), vec![Intent::SetHatActive(true)]);
    }

    #[test]
    fn decodes_escaped_battery_name() {
        let form = parse_form("battery=Ansmann+2S1P%20%28LiIon%29&save_battery=Save\n");
        assert_eq!(
            form.into_intents(),
            vec![Intent::SetSelectedBattery("Ansmann 2S1P (LiIon)".into())]
        );
    }

    #[test]
    fn empty_body_has_no_intents() {
        assert!(parse_form("").into_intents().is_empty());
    }
}

// Gateway event adapters. main.rs routes FullEvent variants here.

pub mod automod_events;
pub mod log_events;
pub mod welcome_events;
pub mod xp_events;

/// Fill `{name}` placeholders in a user-provided template.
pub(crate) fn render_template(template: &str, params: &[(&str, &str)]) -> String {
    let mut message = template.to_string();
    for (name, value) in params {
        message = message.replace(&format!("{{{}}}", name), value);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::render_template;

    #[test]
    fn fills_known_placeholders_and_keeps_unknown_ones() {
        let text = render_template(
            "Welcome {user} to {guild}! {unknown}",
            &[("user", "<@1>"), ("guild", "Rustacean Station")],
        );
        assert_eq!(text, "Welcome <@1> to Rustacean Station! {unknown}");
    }
}

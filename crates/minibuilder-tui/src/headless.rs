use std::collections::VecDeque;
use anyhow::{bail, Result};
use minibuilder_core::{
    Blueprint, Config, Effect, Event, ExtractClient, RequirementsSummary, Session, StaticToken,
    Verifier,
};
use tracing::info;

/// One extraction without the terminal UI
pub async fn run(config: &Config, description: &str, token: &str, json: bool) -> Result<()> {
    print!("{}", extract_report(config, description, token, json).await?);
    Ok(())
}

/// Drive one submission through a fresh session and render what came back
async fn extract_report(config: &Config, description: &str, token: &str, json: bool) -> Result<String> {
    let client = ExtractClient::new(&config.endpoint, config.timeout())?;
    let mut verifier = StaticToken::new(token);
    let mut session = Session::new();

    let mut queue = VecDeque::new();
    if let Some(token) = verifier.obtain() {
        queue.extend(session.update(Event::Verified(token)));
    }
    queue.extend(session.update(Event::Submit {
        description: description.to_string(),
    }));

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Extract(request) => {
                info!(seq = request.seq, "headless extraction");
                let event = client.run(request).await;
                queue.extend(session.update(event));
            }
            Effect::ResetVerification => verifier.invalidate(),
            Effect::ResultsReady | Effect::ModalOpened | Effect::ModalClosed => {}
        }
    }

    if let Some(error) = session.error() {
        bail!("{}", error);
    }

    match (session.blueprint(), session.summary()) {
        (Some(blueprint), _) if json => Ok(format!("{}\n", blueprint.to_pretty_json()?)),
        (Some(blueprint), Some(summary)) => Ok(format_summary(summary, blueprint)),
        _ => bail!("No blueprint was returned"),
    }
}

fn list(label: &str, values: &[String]) -> String {
    if values.is_empty() {
        format!("{}: (none)\n", label)
    } else {
        format!("{}: {}\n", label, values.join(", "))
    }
}

pub fn format_summary(summary: &RequirementsSummary, blueprint: &Blueprint) -> String {
    let mut out = String::new();
    out.push_str(&format!("App: {}\n", summary.app_name));
    out.push_str(&list("Roles", &summary.roles));
    out.push_str(&list("Entities", &summary.entities));
    out.push_str(&list("Features", &summary.features));

    for role in &blueprint.roles {
        out.push_str(&format!("\n[{}]\n", role.name));
        for feature in &role.features {
            out.push_str(&format!("  {} ({})\n", feature.name, feature.entity));
            if !feature.input_fields.is_empty() {
                out.push_str(&format!("    fields:  {}\n", feature.input_fields.join(", ")));
            }
            if !feature.buttons.is_empty() {
                out.push_str(&format!("    buttons: {}\n", feature.buttons.join(", ")));
            }
        }
    }
    out
}

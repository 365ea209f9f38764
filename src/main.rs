use std::env;

use anyhow::{anyhow, bail, Context, Result};
use model_dashboard::{DashboardConfig, FetchOutcome, ModelApi, Session};

const USAGE: &str = "usage: model-dashboard [BASE_URL | CONFIG.json] [predict name=value ...]";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (target, rest) = match args.split_first() {
        Some((first, rest)) if first != "predict" => (Some(first.as_str()), rest),
        _ => (None, args.as_slice()),
    };

    let config = DashboardConfig::resolve(target)?;
    let mut session = Session::new(ModelApi::new(config));
    let scope = session.mount();

    let report = session
        .load_metadata(&scope)
        .await
        .context("metadata task panicked")?;
    session.tick();

    let delivered = [
        &report.model_info,
        &report.input_features,
        &report.train_results,
    ]
    .iter()
    .filter(|o| o.is_delivered())
    .count();
    log::info!("{delivered}/3 metadata fetches delivered");

    match rest {
        [] => {
            println!("{}", serde_json::to_string_pretty(session.state())?);
        }
        [cmd, overrides @ ..] if cmd == "predict" => {
            if let Some(form) = session.form_mut() {
                for pair in overrides {
                    let (name, value) = pair
                        .split_once('=')
                        .ok_or_else(|| anyhow!("expected name=value, got '{pair}'"))?;
                    form.set_text(name, value)?;
                }
            } else if !overrides.is_empty() {
                bail!("input features are unavailable, cannot apply overrides");
            }

            let outcome = session
                .submit(&scope)
                .await
                .context("prediction task panicked")?;
            session.tick();

            match (outcome, &session.state().prediction) {
                (FetchOutcome::Failed(e), _) => bail!("prediction failed: {e}"),
                (_, Some(prediction)) => println!("{prediction}"),
                (_, None) => bail!("no prediction received"),
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

//! Pre Sign-Up Lambda - Cognito Pre Sign-Up Trigger
//!
//! Cognito invokes this Lambda synchronously before a registration completes,
//! including the first sign-in through Google. Only e-mail addresses listed in
//! `ALLOW_EMAILS` may register; everything else fails with `Forbidden`.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::{AllowList, PreSignUpEvent};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

async fn handler(
    allow_list: Arc<AllowList>,
    event: LambdaEvent<PreSignUpEvent>,
) -> Result<PreSignUpEvent, Error> {
    let trigger = event.payload;

    info!(
        "Processing {} trigger for user {}",
        trigger.trigger_source, trigger.user_name
    );

    if !trigger.is_pre_sign_up() {
        info!("Skipping non-PreSignUp trigger");
        return Ok(trigger);
    }

    if let Err(e) = allow_list.admit(&trigger) {
        warn!("Rejected sign-up for user {}", trigger.user_name);
        return Err(e.into());
    }

    info!("Admitted sign-up for user {}", trigger.user_name);

    // Return the event back to Cognito (required format)
    Ok(trigger)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let allow_list = Arc::new(AllowList::from_env());
    if allow_list.is_empty() {
        warn!("ALLOW_EMAILS is empty, every sign-up will be rejected");
    }

    run(service_fn(move |event| {
        let allow_list = Arc::clone(&allow_list);
        async move { handler(allow_list, event).await }
    }))
    .await
}

//! Cognito user pool with Google sign-in.
//!
//! Declares the user pool, its hosted domain, the pre sign-up trigger, the
//! Google identity provider and the app client, and the outputs needed to
//! start the authorization-code flow.

use std::collections::BTreeMap;

use shared::config::{join_list, ALLOW_EMAILS_VAR};
use shared::{Error, Result};
use tracing::debug;

use crate::config::StackConfig;
use crate::resources::{
    AccountRecoverySetting, AdminCreateUserConfig, Function, FunctionCode, FunctionEnvironment,
    GoogleProviderDetails, LambdaConfig, Permission, RecoveryOption, Role, SchemaAttribute,
    UserPool, UserPoolClient, UserPoolDomain, UserPoolIdentityProvider,
};
use crate::template::{Bindings, Expr, Parameter, Pseudo, Resource, SecretReference, Template};

pub const USER_POOL: &str = "UserPool";
pub const USER_POOL_DOMAIN: &str = "UserPoolDomain";
pub const PRE_SIGN_UP_ROLE: &str = "PreSignUpFunctionServiceRole";
pub const PRE_SIGN_UP_FUNCTION: &str = "PreSignUpFunction";
pub const PRE_SIGN_UP_PERMISSION: &str = "PreSignUpFunctionInvokePermission";
pub const GOOGLE_PROVIDER: &str = "UserPoolIdentityProviderGoogle";
pub const USER_POOL_CLIENT: &str = "UserPoolClient";

pub const CODE_BUCKET_PARAMETER: &str = "PreSignUpCodeS3Bucket";
pub const CODE_KEY_PARAMETER: &str = "PreSignUpCodeS3Key";

pub const USER_POOL_ID_OUTPUT: &str = "UserPoolIdOutput";
pub const USER_POOL_ARN_OUTPUT: &str = "UserPoolArnOutput";
pub const USER_POOL_DOMAIN_OUTPUT: &str = "UserPoolDomainOutput";
pub const USER_POOL_CLIENT_ID_OUTPUT: &str = "UserPoolClientIdOutput";
pub const AUTHORIZE_URL_OUTPUT: &str = "AuthorizeURLOutput";

/// Name Cognito gives the Google provider; clients list it by this name.
pub const GOOGLE_PROVIDER_NAME: &str = "Google";
pub const COGNITO_DOMAIN_SUFFIX: &str = "amazoncognito.com";
const LAMBDA_BASIC_EXECUTION_POLICY: &str =
    ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Percent-encode a URI component, leaving `A-Za-z0-9-_.!~*'()` as is.
pub fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// AWS partition a region belongs to.
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else {
        "aws"
    }
}

/// Hosted UI hostname for a domain prefix in a region.
pub fn hosted_domain(domain_prefix: &str, region: &str) -> String {
    format!("{}.auth.{}.{}", domain_prefix, region, COGNITO_DOMAIN_SUFFIX)
}

/// Authorization URL that starts the code flow straight at Google.
pub fn authorize_url(domain_prefix: &str, region: &str, client_id: &str, callback_url: &str) -> String {
    format!(
        "https://{}/authorize?client_id={}&redirect_uri={}&response_type=code&identity_provider={}",
        hosted_domain(domain_prefix, region),
        client_id,
        encode_uri_component(callback_url),
        GOOGLE_PROVIDER_NAME
    )
}

fn hosted_domain_expr(domain_prefix: &str) -> Expr {
    Expr::concat([
        Expr::from(format!("{}.auth.", domain_prefix)),
        Expr::region(),
        Expr::from(format!(".{}", COGNITO_DOMAIN_SUFFIX)),
    ])
}

fn authorize_url_expr(domain_prefix: &str, callback_url: &str) -> Expr {
    Expr::concat([
        Expr::from("https://"),
        hosted_domain_expr(domain_prefix),
        Expr::from("/authorize?client_id="),
        Expr::reference(USER_POOL_CLIENT),
        Expr::from(format!(
            "&redirect_uri={}&response_type=code&identity_provider={}",
            encode_uri_component(callback_url),
            GOOGLE_PROVIDER_NAME
        )),
    ])
}

/// Stack definition.
pub struct CognitoStack;

impl CognitoStack {
    /// Build the template for `config`.
    ///
    /// Provider-side constraints (domain prefix uniqueness, secret existence,
    /// URL syntax) are left to CloudFormation.
    pub fn synthesize(config: &StackConfig) -> Result<Template> {
        let first_callback = config.callback_urls.first().ok_or_else(|| {
            Error::Config("callback_urls must contain at least one URL".to_string())
        })?;

        let mut template = Template::new(format!(
            "{}: Cognito user pool {} with Google sign-in",
            config.stack_name, config.user_pool_name
        ));

        template.add_parameter(
            CODE_BUCKET_PARAMETER,
            Parameter::string("S3 bucket holding the pre sign-up Lambda bundle"),
        )?;
        template.add_parameter(
            CODE_KEY_PARAMETER,
            Parameter::string("S3 key of the pre sign-up Lambda bundle (bootstrap zip)"),
        )?;

        Self::add_pre_sign_up_trigger(&mut template, &config.sign_up_allow_emails)?;
        Self::add_user_pool(&mut template, &config.user_pool_name, &config.domain_prefix)?;
        Self::add_google_provider(&mut template, &config.google_oauth_client_secret_name)?;
        Self::add_client(&mut template, &config.client_name, &config.callback_urls)?;

        template.add_output(
            AUTHORIZE_URL_OUTPUT,
            "Authorization endpoint that signs in through Google",
            authorize_url_expr(&config.domain_prefix, first_callback),
        )?;

        debug!(
            resources = template.resources.len(),
            outputs = template.outputs.len(),
            "synthesized stack {}",
            config.stack_name
        );

        Ok(template)
    }

    fn add_pre_sign_up_trigger(template: &mut Template, allow_emails: &[String]) -> Result<()> {
        let role = Role::for_lambda(vec![Expr::concat([
            Expr::from("arn:"),
            Expr::Pseudo(Pseudo::Partition),
            Expr::from(LAMBDA_BASIC_EXECUTION_POLICY),
        ])]);
        template.add_resource(PRE_SIGN_UP_ROLE, Resource::new(&role)?)?;

        let function = Function {
            code: FunctionCode {
                s3_bucket: Expr::reference(CODE_BUCKET_PARAMETER),
                s3_key: Expr::reference(CODE_KEY_PARAMETER),
            },
            handler: "bootstrap".to_string(),
            runtime: "provided.al2023".to_string(),
            role: Expr::get_att(PRE_SIGN_UP_ROLE, "Arn"),
            timeout: 5,
            memory_size: 128,
            environment: FunctionEnvironment {
                variables: BTreeMap::from([(ALLOW_EMAILS_VAR.to_string(), join_list(allow_emails))]),
            },
        };
        template.add_resource(
            PRE_SIGN_UP_FUNCTION,
            Resource::new(&function)?.depends_on(PRE_SIGN_UP_ROLE),
        )?;

        let permission = Permission {
            action: "lambda:InvokeFunction".to_string(),
            function_name: Expr::get_att(PRE_SIGN_UP_FUNCTION, "Arn"),
            principal: "cognito-idp.amazonaws.com".to_string(),
            source_arn: Expr::get_att(USER_POOL, "Arn"),
        };
        template.add_resource(PRE_SIGN_UP_PERMISSION, Resource::new(&permission)?)
    }

    fn add_user_pool(template: &mut Template, user_pool_name: &str, domain_prefix: &str) -> Result<()> {
        let user_pool = UserPool {
            user_pool_name: user_pool_name.to_string(),
            alias_attributes: vec!["email".to_string()],
            auto_verified_attributes: vec!["email".to_string()],
            schema: vec![
                SchemaAttribute::required_standard("email"),
                SchemaAttribute::required_standard("name"),
            ],
            admin_create_user_config: AdminCreateUserConfig {
                allow_admin_create_user_only: true,
            },
            account_recovery_setting: AccountRecoverySetting {
                recovery_mechanisms: vec![RecoveryOption {
                    name: "verified_email".to_string(),
                    priority: 1,
                }],
            },
            lambda_config: Some(LambdaConfig {
                pre_sign_up: Expr::get_att(PRE_SIGN_UP_FUNCTION, "Arn"),
            }),
        };
        template.add_resource(USER_POOL, Resource::new(&user_pool)?)?;

        // Google's OAuth client must allow the origin
        // https://{prefix}.auth.{region}.amazoncognito.com and the redirect URI
        // https://{prefix}.auth.{region}.amazoncognito.com/oauth2/idpresponse
        let domain = UserPoolDomain {
            domain: domain_prefix.to_string(),
            user_pool_id: Expr::reference(USER_POOL),
        };
        template.add_resource(USER_POOL_DOMAIN, Resource::new(&domain)?)?;

        template.add_output(
            USER_POOL_ID_OUTPUT,
            "User pool ID",
            Expr::reference(USER_POOL),
        )?;
        template.add_output(
            USER_POOL_ARN_OUTPUT,
            "User pool ARN",
            Expr::get_att(USER_POOL, "Arn"),
        )?;
        template.add_output(
            USER_POOL_DOMAIN_OUTPUT,
            "Hosted UI domain",
            hosted_domain_expr(domain_prefix),
        )
    }

    fn add_google_provider(template: &mut Template, secret_name: &str) -> Result<()> {
        let provider = UserPoolIdentityProvider {
            provider_name: GOOGLE_PROVIDER_NAME.to_string(),
            provider_type: GOOGLE_PROVIDER_NAME.to_string(),
            user_pool_id: Expr::reference(USER_POOL),
            provider_details: GoogleProviderDetails {
                client_id: SecretReference::json_field(secret_name, "client_id").to_string(),
                client_secret: SecretReference::json_field(secret_name, "client_secret").to_string(),
                authorize_scopes: "profile email".to_string(),
            },
            attribute_mapping: BTreeMap::from([
                ("email".to_string(), "email".to_string()),
                ("name".to_string(), "name".to_string()),
            ]),
        };
        template.add_resource(GOOGLE_PROVIDER, Resource::new(&provider)?)
    }

    fn add_client(template: &mut Template, client_name: &str, callback_urls: &[String]) -> Result<()> {
        let client = UserPoolClient {
            user_pool_id: Expr::reference(USER_POOL),
            client_name: client_name.to_string(),
            generate_secret: false,
            supported_identity_providers: vec![GOOGLE_PROVIDER_NAME.to_string()],
            allowed_oauth_flows: vec!["code".to_string()],
            allowed_oauth_flows_user_pool_client: true,
            allowed_oauth_scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            callback_urls: callback_urls.to_vec(),
        };

        // The client names the provider instead of referencing it, so
        // CloudFormation cannot infer that the provider has to exist first.
        template.add_resource(
            USER_POOL_CLIENT,
            Resource::new(&client)?.depends_on(GOOGLE_PROVIDER),
        )?;

        template.add_output(
            USER_POOL_CLIENT_ID_OUTPUT,
            "App client ID",
            Expr::reference(USER_POOL_CLIENT),
        )
    }

    /// Bindings for previewing outputs of a deployed stack.
    pub fn deployed_bindings(
        region: &str,
        account_id: Option<&str>,
        user_pool_id: &str,
        client_id: &str,
    ) -> Bindings {
        let partition = partition_for_region(region);
        let mut bindings = Bindings::new()
            .with_region(region)
            .with_pseudo(Pseudo::Partition, partition)
            .with_ref(USER_POOL, user_pool_id)
            .with_ref(USER_POOL_CLIENT, client_id);

        if let Some(account_id) = account_id {
            bindings = bindings.with_pseudo(Pseudo::AccountId, account_id).with_attribute(
                USER_POOL,
                "Arn",
                format!(
                    "arn:{}:cognito-idp:{}:{}:userpool/{}",
                    partition, region, account_id, user_pool_id
                ),
            );
        }

        bindings
    }
}

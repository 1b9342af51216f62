//! Typed properties for the CloudFormation resources this stack declares.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::template::{Expr, ResourceProperties};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPool {
    pub user_pool_name: String,
    pub alias_attributes: Vec<String>,
    pub auto_verified_attributes: Vec<String>,
    pub schema: Vec<SchemaAttribute>,
    pub admin_create_user_config: AdminCreateUserConfig,
    pub account_recovery_setting: AccountRecoverySetting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda_config: Option<LambdaConfig>,
}

impl ResourceProperties for UserPool {
    const TYPE: &'static str = "AWS::Cognito::UserPool";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaAttribute {
    pub name: String,
    pub attribute_data_type: String,
    pub mutable: bool,
    pub required: bool,
}

impl SchemaAttribute {
    /// A required, mutable standard attribute such as `email` or `name`.
    pub fn required_standard(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_data_type: "String".to_string(),
            mutable: true,
            required: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdminCreateUserConfig {
    pub allow_admin_create_user_only: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountRecoverySetting {
    pub recovery_mechanisms: Vec<RecoveryOption>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecoveryOption {
    pub name: String,
    pub priority: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LambdaConfig {
    pub pre_sign_up: Expr,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPoolDomain {
    pub domain: String,
    pub user_pool_id: Expr,
}

impl ResourceProperties for UserPoolDomain {
    const TYPE: &'static str = "AWS::Cognito::UserPoolDomain";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPoolIdentityProvider {
    pub provider_name: String,
    pub provider_type: String,
    pub user_pool_id: Expr,
    pub provider_details: GoogleProviderDetails,
    pub attribute_mapping: BTreeMap<String, String>,
}

impl ResourceProperties for UserPoolIdentityProvider {
    const TYPE: &'static str = "AWS::Cognito::UserPoolIdentityProvider";
}

/// Provider details keys are Cognito's own snake_case names.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleProviderDetails {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_scopes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPoolClient {
    pub user_pool_id: Expr,
    pub client_name: String,
    pub generate_secret: bool,
    pub supported_identity_providers: Vec<String>,
    #[serde(rename = "AllowedOAuthFlows")]
    pub allowed_oauth_flows: Vec<String>,
    #[serde(rename = "AllowedOAuthFlowsUserPoolClient")]
    pub allowed_oauth_flows_user_pool_client: bool,
    #[serde(rename = "AllowedOAuthScopes")]
    pub allowed_oauth_scopes: Vec<String>,
    #[serde(rename = "CallbackURLs")]
    pub callback_urls: Vec<String>,
}

impl ResourceProperties for UserPoolClient {
    const TYPE: &'static str = "AWS::Cognito::UserPoolClient";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub assume_role_policy_document: Value,
    pub managed_policy_arns: Vec<Expr>,
}

impl ResourceProperties for Role {
    const TYPE: &'static str = "AWS::IAM::Role";
}

impl Role {
    /// Execution role assumable by Lambda with the given managed policies.
    pub fn for_lambda(managed_policy_arns: Vec<Expr>) -> Self {
        Self {
            assume_role_policy_document: serde_json::json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" }
                }]
            }),
            managed_policy_arns,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    pub code: FunctionCode,
    pub handler: String,
    pub runtime: String,
    pub role: Expr,
    pub timeout: u32,
    pub memory_size: u32,
    pub environment: FunctionEnvironment,
}

impl ResourceProperties for Function {
    const TYPE: &'static str = "AWS::Lambda::Function";
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionCode {
    #[serde(rename = "S3Bucket")]
    pub s3_bucket: Expr,
    #[serde(rename = "S3Key")]
    pub s3_key: Expr,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionEnvironment {
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Permission {
    pub action: String,
    pub function_name: Expr,
    pub principal: String,
    pub source_arn: Expr,
}

impl ResourceProperties for Permission {
    const TYPE: &'static str = "AWS::Lambda::Permission";
}

//! Query API authentication environment.
//!
//! Exactly one mode contributes variables; switching modes never leaves
//! variables of another mode behind.

use std::path::PathBuf;

use appstack_common::config::DeploymentParams;
use appstack_common::constants::{DEFAULT_PE_RBAC_CA_CERT_FILE, SYSTEM_TRUST_SENTINEL};
use appstack_common::types::QueryAuth;

use crate::env::EnvVar;
use crate::validator::non_empty_str;

/// Variables contributed by the selected auth mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAuthEnv {
    /// Mode in effect.
    pub mode: QueryAuth,
    /// Variables for the backend service.
    pub backend: Vec<EnvVar>,
    /// Variables for the frontend service.
    pub frontend: Vec<EnvVar>,
    /// CA file the backend needs mounted to reach the RBAC service.
    pub ca_cert_file: Option<PathBuf>,
}

/// Returns the mode in effect.
///
/// An explicit `data_entitlement_query_auth` wins. Without one, a username
/// and password select basic auth, and anything else selects no auth.
#[must_use]
pub fn effective_mode(params: &DeploymentParams) -> QueryAuth {
    if let Some(mode) = params.data_entitlement_query_auth {
        return mode;
    }
    let has_user = non_empty_str(params.data_entitlement_query_username.as_ref()).is_some();
    let has_password = params
        .data_entitlement_query_password
        .as_ref()
        .is_some_and(|p| !p.is_empty());
    if has_user && has_password {
        QueryAuth::BasicAuth
    } else {
        QueryAuth::None
    }
}

/// Builds the environment for the effective auth mode.
///
/// Missing fields of the selected mode are skipped with a warning rather
/// than failing; the backend rejects an incomplete configuration itself.
#[must_use]
pub fn resolve_auth_env(params: &DeploymentParams) -> QueryAuthEnv {
    let mode = effective_mode(params);
    tracing::debug!(%mode, "resolving query auth");

    let mut env = QueryAuthEnv {
        mode,
        backend: Vec::new(),
        frontend: Vec::new(),
        ca_cert_file: None,
    };

    match mode {
        QueryAuth::None => {}
        QueryAuth::Oidc => oidc_env(params, &mut env),
        QueryAuth::PeRbac => pe_rbac_env(params, &mut env),
        QueryAuth::BasicAuth => basic_auth_env(params, &mut env),
    }
    env
}

fn oidc_env(params: &DeploymentParams, env: &mut QueryAuthEnv) {
    match non_empty_str(params.data_entitlement_query_oidc_issuer.as_ref()) {
        Some(issuer) => {
            env.backend
                .push(EnvVar::plain("HDP_HTTP_QUERY_SSO_ISSUER", issuer));
            env.frontend.push(EnvVar::plain("REACT_APP_SSO_ISSUER", issuer));
        }
        None => tracing::warn!("oidc auth selected without data_entitlement_query_oidc_issuer"),
    }
    match non_empty_str(params.data_entitlement_query_oidc_client_id.as_ref()) {
        Some(client_id) => {
            env.backend
                .push(EnvVar::plain("HDP_HTTP_QUERY_SSO_CLIENTID", client_id));
            env.frontend
                .push(EnvVar::plain("REACT_APP_SSO_CLIENT_ID", client_id));
        }
        None => tracing::warn!("oidc auth selected without data_entitlement_query_oidc_client_id"),
    }
}

fn pe_rbac_env(params: &DeploymentParams, env: &mut QueryAuthEnv) {
    match non_empty_str(params.data_entitlement_query_pe_rbac_service.as_ref()) {
        Some(service) => env.backend.push(EnvVar::plain(
            "HDP_HTTP_QUERY_PE_RBAC_SERVICE_LOCATION",
            service,
        )),
        None => tracing::warn!("pe_rbac auth selected without data_entitlement_query_pe_rbac_service"),
    }
    env.backend.push(EnvVar::plain(
        "HDP_HTTP_QUERY_PE_RBAC_ROLE_ID",
        params.data_entitlement_query_pe_rbac_role_id.to_string(),
    ));

    let ca = non_empty_str(params.data_entitlement_query_pe_rbac_ca_cert_file.as_ref())
        .unwrap_or(DEFAULT_PE_RBAC_CA_CERT_FILE);
    if ca == SYSTEM_TRUST_SENTINEL {
        tracing::debug!("pe_rbac uses the system trust store");
    } else {
        env.backend
            .push(EnvVar::plain("HDP_HTTP_QUERY_PE_RBAC_CA_CERT_FILE", ca));
        env.ca_cert_file = Some(PathBuf::from(ca));
    }
}

fn basic_auth_env(params: &DeploymentParams, env: &mut QueryAuthEnv) {
    match non_empty_str(params.data_entitlement_query_username.as_ref()) {
        Some(user) => env.backend.push(EnvVar::plain("HDP_HTTP_QUERY_USER", user)),
        None => tracing::warn!("basic_auth selected without data_entitlement_query_username"),
    }
    match params
        .data_entitlement_query_password
        .as_ref()
        .filter(|p| !p.is_empty())
    {
        Some(password) => env
            .backend
            .push(EnvVar::secret("HDP_HTTP_QUERY_PASSWORD", password.clone())),
        None => tracing::warn!("basic_auth selected without data_entitlement_query_password"),
    }
}

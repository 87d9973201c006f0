//! Per-service OAuth2 endpoint and credential configuration
//!
//! One immutable [`ServiceConfig`] per third-party service. The
//! constructors hard-code each service's authorization/token endpoints
//! and default scope; callers supply only the app's own client
//! credentials, the redirect URI, and any service-specific parameter
//! (sandbox flag, shop domain, subdomain).

use common::Secret;

/// OAuth2 configuration for a single service.
///
/// Immutable once constructed. The client secret is wrapped in
/// [`Secret`] so derived Debug output stays safe to log.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service name, used as the registry/store key (e.g. "salesforce")
    pub service_name: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Authorization endpoint the resource owner is redirected to
    pub authorization_url: String,
    /// Token endpoint for code exchange and refresh
    pub token_url: String,
    pub redirect_uri: String,
    /// Space- or comma-separated scope string, per the service's convention
    pub scope: String,
}

impl ServiceConfig {
    /// Salesforce. `sandbox` switches to the test login host.
    pub fn salesforce(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        redirect_uri: impl Into<String>,
        sandbox: bool,
    ) -> Self {
        let base = if sandbox {
            "https://test.salesforce.com"
        } else {
            "https://login.salesforce.com"
        };
        Self {
            service_name: "salesforce".into(),
            client_id: client_id.into(),
            client_secret,
            authorization_url: format!("{base}/services/oauth2/authorize"),
            token_url: format!("{base}/services/oauth2/token"),
            redirect_uri: redirect_uri.into(),
            scope: "api refresh_token offline_access".into(),
        }
    }

    /// Shopify. Endpoints live under the shop's own admin host.
    pub fn shopify(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        redirect_uri: impl Into<String>,
        shop_domain: &str,
    ) -> Self {
        Self {
            service_name: "shopify".into(),
            client_id: client_id.into(),
            client_secret,
            authorization_url: format!("https://{shop_domain}/admin/oauth/authorize"),
            token_url: format!("https://{shop_domain}/admin/oauth/access_token"),
            redirect_uri: redirect_uri.into(),
            scope: "read_orders,write_orders,read_products,write_products,read_customers,write_customers".into(),
        }
    }

    /// HubSpot. Authorization and token endpoints are on different hosts.
    pub fn hubspot(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            service_name: "hubspot".into(),
            client_id: client_id.into(),
            client_secret,
            authorization_url: "https://app.hubspot.com/oauth/authorize".into(),
            token_url: "https://api.hubapi.com/oauth/v1/token".into(),
            redirect_uri: redirect_uri.into(),
            scope: "contacts,crm.objects.contacts.read,crm.objects.contacts.write".into(),
        }
    }

    /// Slack (OAuth v2).
    pub fn slack(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            service_name: "slack".into(),
            client_id: client_id.into(),
            client_secret,
            authorization_url: "https://slack.com/oauth/v2/authorize".into(),
            token_url: "https://slack.com/api/oauth.v2.access".into(),
            redirect_uri: redirect_uri.into(),
            scope: "chat:write,channels:read,files:write".into(),
        }
    }

    /// Calendly.
    pub fn calendly(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            service_name: "calendly".into(),
            client_id: client_id.into(),
            client_secret,
            authorization_url: "https://auth.calendly.com/oauth/authorize".into(),
            token_url: "https://auth.calendly.com/oauth/token".into(),
            redirect_uri: redirect_uri.into(),
            scope: "default".into(),
        }
    }

    /// Zendesk. Endpoints live under the account's subdomain.
    pub fn zendesk(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        redirect_uri: impl Into<String>,
        subdomain: &str,
    ) -> Self {
        Self {
            service_name: "zendesk".into(),
            client_id: client_id.into(),
            client_secret,
            authorization_url: format!("https://{subdomain}.zendesk.com/oauth/authorizations/new"),
            token_url: format!("https://{subdomain}.zendesk.com/oauth/tokens"),
            redirect_uri: redirect_uri.into(),
            scope: "read write".into(),
        }
    }
}

use crate::api::{Account, AdClient, AdUnit};

pub fn account_line(account: &Account) -> String {
    format!(
        "Found account with resource name \"{}\" and display name \"{}\".",
        account.name, account.display_name
    )
}

pub fn ad_client_line(ad_client: &AdClient) -> String {
    format!(
        "Found ad client for product \"{}\" with resource name \"{}\".",
        ad_client.product_code, ad_client.name
    )
}

pub fn ad_unit_line(ad_unit: &AdUnit) -> String {
    format!(
        "Found ad unit with resource name \"{}\" and display name \"{}\".",
        ad_unit.name, ad_unit.display_name
    )
}

/// Menu label: display name when present, resource name otherwise.
pub fn account_label(account: &Account) -> String {
    if account.display_name.is_empty() {
        account.name.clone()
    } else {
        format!("{} ({})", account.display_name, account.name)
    }
}

pub fn ad_client_label(ad_client: &AdClient) -> String {
    match (ad_client.product_code.as_str(), ad_client.state.as_deref()) {
        ("", _) => ad_client.name.clone(),
        (product, Some(state)) => format!("{} [{}, {}]", ad_client.name, product, state),
        (product, None) => format!("{} [{}]", ad_client.name, product),
    }
}

/// Last path segment of a resource name, `accounts/pub-1` -> `pub-1`.
pub fn resource_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

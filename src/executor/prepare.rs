use serde_json::{Map, Value};

use crate::context::DataContext;
use crate::datasource::{Endpoint, OutboundMapping, RequestConfig};
use crate::error::DatasourceResult;
use crate::template::TemplateRenderer;

use super::models::{set_header, Preparation, PreparedRequest};

/// Renders `endpoint` against `data`, applying the query string and outbound mapping.
pub(crate) fn prepare_request(
    renderer: &dyn TemplateRenderer,
    endpoint: &Endpoint,
    data: &DataContext,
    config: &RequestConfig,
) -> DatasourceResult<Preparation> {
    let mut context = data.clone();

    let method = renderer.render(&endpoint.method, &context)?;
    let mut url = renderer.render(&endpoint.url, &context)?;

    if let Some(query) = &config.query_string {
        append_query_string(&mut url, query);
    }

    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
    for header in &endpoint.headers {
        let name = renderer.render(&header.key, &context)?;
        let value = renderer.render(&header.value, &context)?;
        set_header(&mut headers, name, value);
    }

    let body_template = endpoint.body.as_deref().unwrap_or_default();
    let body = match &config.outbound_config {
        Some(outbound) if body_template.is_empty() => outbound_body(outbound),
        Some(outbound) => {
            for mapping in outbound {
                let value = match &mapping.value {
                    Value::String(template) => Value::String(renderer.render(template, &context)?),
                    other => other.clone(),
                };
                context.insert(mapping.property.clone(), value);
            }
            renderer.render(body_template, &context)?
        }
        None => renderer.render(body_template, &context)?,
    };

    let body_type = renderer.render(endpoint.body_type.as_deref().unwrap_or_default(), &context)?;

    Ok(Preparation {
        request: PreparedRequest {
            method,
            url,
            headers,
            body,
            body_type,
        },
        context,
    })
}

pub(crate) fn append_query_string(url: &mut String, query: &str) {
    let separator = if url.contains('?') { '&' } else { '?' };
    url.push(separator);
    url.push_str(query);
}

fn outbound_body(outbound: &[OutboundMapping]) -> String {
    let mapped: Map<String, Value> = outbound
        .iter()
        .map(|mapping| (mapping.property.clone(), mapping.value.clone()))
        .collect();
    Value::Object(mapped).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MiniJinjaRenderer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data() -> DataContext {
        match json!({"id": 7, "name": "ada", "host": "api.test"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn prepare(endpoint: &Endpoint, config: &RequestConfig) -> Preparation {
        prepare_request(&MiniJinjaRenderer::new(), endpoint, &data(), config).unwrap()
    }

    fn outbound(pairs: &[(&str, Value)]) -> Option<Vec<OutboundMapping>> {
        Some(
            pairs
                .iter()
                .map(|(property, value)| OutboundMapping {
                    property: property.to_string(),
                    value: value.clone(),
                })
                .collect(),
        )
    }

    #[test]
    fn renders_method_and_url_verbatim() {
        let endpoint = Endpoint::new("{{ 'post' }}", "https://{{host}}/users/{{ id }}");
        let prepared = prepare(&endpoint, &RequestConfig::for_endpoint("users"));

        assert_eq!(prepared.request.method, "post");
        assert_eq!(prepared.request.url, "https://api.test/users/7");
        assert_eq!(prepared.request.body, "");
        assert_eq!(prepared.request.body_type, "");
    }

    #[test]
    fn query_string_separator_depends_on_existing_query() {
        let mut config = RequestConfig::for_endpoint("users");
        config.query_string = Some("page=2".into());

        let plain = prepare(&Endpoint::new("GET", "https://api.test/users"), &config);
        assert_eq!(plain.request.url, "https://api.test/users?page=2");

        let with_query = prepare(&Endpoint::new("GET", "https://api.test/users?sort=id"), &config);
        assert_eq!(with_query.request.url, "https://api.test/users?sort=id&page=2");
    }

    #[test]
    fn configured_headers_render_and_override_accept() {
        let endpoint = Endpoint::new("GET", "https://api.test")
            .with_header("X-User", "{{ name }}")
            .with_header("Accept", "text/csv")
            .with_header("X-User", "{{ id }}");
        let prepared = prepare(&endpoint, &RequestConfig::for_endpoint("users"));

        assert_eq!(
            prepared.request.headers,
            vec![
                ("Accept".to_string(), "text/csv".to_string()),
                ("X-User".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn outbound_mapping_with_empty_body_encodes_raw_values() {
        let mut config = RequestConfig::for_endpoint("users");
        config.outbound_config = outbound(&[
            ("first", json!("literal")),
            ("second", json!(5)),
            ("raw", json!("{{ id }}")),
        ]);
        let prepared = prepare(&Endpoint::new("POST", "https://api.test"), &config);

        assert_eq!(prepared.request.body, r#"{"first":"literal","second":5,"raw":"{{ id }}"}"#);
        assert_eq!(prepared.context, data());
    }

    #[test]
    fn outbound_mapping_with_body_augments_returned_context() {
        let mut config = RequestConfig::for_endpoint("users");
        config.outbound_config = outbound(&[
            ("label", json!("user-{{ id }}")),
            ("shout", json!("{{ label }}!")),
        ]);
        let endpoint = Endpoint::new("POST", "https://api.test")
            .with_body(r#"{"label":"{{ label }}","shout":"{{ shout }}"}"#, "json");

        let original = data();
        let prepared = prepare_request(&MiniJinjaRenderer::new(), &endpoint, &original, &config)
            .unwrap();

        assert_eq!(prepared.request.body, r#"{"label":"user-7","shout":"user-7!"}"#);
        assert_eq!(prepared.request.body_type, "json");
        assert_eq!(prepared.context.get("label"), Some(&json!("user-7")));
        assert!(!original.contains_key("label"));
    }

    #[test]
    fn body_type_is_rendered_as_a_template() {
        let mut ctx = data();
        ctx.insert("kind".into(), json!("form-data"));
        let endpoint = Endpoint::new("POST", "https://api.test").with_body("{}", "{{ kind }}");

        let prepared = prepare_request(
            &MiniJinjaRenderer::new(),
            &endpoint,
            &ctx,
            &RequestConfig::for_endpoint("users"),
        )
        .unwrap();
        assert!(prepared.request.is_form_data());
    }
}

// ── Report renderers ──

use csv::Writer;
use handlebars::Handlebars;
use serde_json::{Value, json};

use crate::error::CoreError;
use crate::model::{ReportKind, ReportLayerRow, ReportSnapshot};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S UTC";

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>
  body { font-family: sans-serif; margin: 2rem; color: #0f172a; }
  table { border-collapse: collapse; width: 100%; }
  th, td { border: 1px solid #cbd5e1; padding: .4rem .6rem; text-align: left; }
  .ok { color: #16a34a; } .down { color: #dc2626; }
  @media print { body { margin: 0; } }
</style>
</head>
<body>
<h1>{{title}}</h1>
<p>Gerado em {{generated_at}}</p>
<p><strong>Servidor:</strong> {{server}} &middot; <strong>Workspace:</strong> {{workspace}}</p>
{{#if status}}
<h2>Resumo</h2>
<ul>
  <li>Camadas disponíveis: {{metrics.layers_available}} de {{metrics.layers_total}}</li>
  <li>Disponibilidade: {{metrics.availability_percent}}%</li>
  <li>Total de feições: {{metrics.total_features}}</li>
</ul>
{{/if}}
<h2>Camadas</h2>
<table>
<thead><tr><th>Camada</th><th>Nome</th>{{#unless status}}<th>Geometria</th>{{/unless}}<th>Status</th><th>Feições</th><th>Última verificação</th></tr></thead>
<tbody>
{{#each layers}}
<tr><td>{{title}}</td><td>{{qualified_name}}</td>{{#unless ../status}}<td>{{geometry}}</td>{{/unless}}<td class="{{#if available}}ok{{else}}down{{/if}}">{{status}}</td><td>{{feature_count}}</td><td>{{last_checked}}</td></tr>
{{/each}}
</tbody>
</table>
</body>
</html>
"#;

pub(super) fn html(snapshot: &ReportSnapshot) -> Result<String, CoreError> {
    let handlebars = Handlebars::new();
    Ok(handlebars.render_template(HTML_TEMPLATE, &context(snapshot))?)
}

pub(super) fn csv(snapshot: &ReportSnapshot) -> Result<String, CoreError> {
    let mut wtr = Writer::from_writer(vec![]);

    match snapshot.kind {
        ReportKind::Status => {
            wtr.write_record(["camada", "nome", "status", "feicoes", "ultima_verificacao"])?;
            for row in &snapshot.layers {
                wtr.write_record([
                    row.title.clone(),
                    row.qualified_name.clone(),
                    status_label(row).to_owned(),
                    row.feature_count.to_string(),
                    last_checked(row),
                ])?;
            }
        }
        ReportKind::Inventory => {
            wtr.write_record([
                "chave",
                "camada",
                "nome",
                "geometria",
                "disponivel",
                "feicoes",
                "ultima_verificacao",
            ])?;
            for row in &snapshot.layers {
                wtr.write_record([
                    row.key.clone(),
                    row.title.clone(),
                    row.qualified_name.clone(),
                    row.geometry.to_string(),
                    row.available.to_string(),
                    row.feature_count.to_string(),
                    last_checked(row),
                ])?;
            }
        }
    }

    let data = wtr.into_inner().map_err(|e| CoreError::Report {
        message: e.to_string(),
    })?;
    String::from_utf8(data).map_err(|e| CoreError::Report {
        message: e.to_string(),
    })
}

fn context(snapshot: &ReportSnapshot) -> Value {
    let ratio = snapshot
        .derived_metrics
        .get("availability_ratio")
        .copied()
        .unwrap_or_default();
    let layers: Vec<Value> = snapshot
        .layers
        .iter()
        .map(|row| {
            json!({
                "title": row.title,
                "qualified_name": row.qualified_name,
                "geometry": row.geometry.to_string(),
                "available": row.available,
                "status": status_label(row),
                "feature_count": row.feature_count,
                "last_checked": last_checked(row),
            })
        })
        .collect();

    json!({
        "title": snapshot.kind.title(),
        "status": snapshot.kind == ReportKind::Status,
        "generated_at": snapshot.generated_at.format(TIMESTAMP_FORMAT).to_string(),
        "server": snapshot.server,
        "workspace": snapshot.workspace,
        "metrics": {
            "layers_total": snapshot.layers.len(),
            "layers_available": snapshot.layers.iter().filter(|r| r.available).count(),
            "total_features": snapshot.layer_counts.values().sum::<u64>(),
            "availability_percent": format!("{:.0}", ratio * 100.0),
        },
        "layers": layers,
    })
}

fn status_label(row: &ReportLayerRow) -> &'static str {
    if row.available { "Disponível" } else { "Indisponível" }
}

fn last_checked(row: &ReportLayerRow) -> String {
    row.last_checked_at
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "-".into())
}

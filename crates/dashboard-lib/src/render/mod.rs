//! Static HTML rendering of a dashboard snapshot
//!
//! This is the only place presentation strings are built: readiness ratios,
//! health labels and tag lists are all formatted here from structured data.

mod html;

pub use html::{esc, Escaped};

use crate::aggregate::{
    group_by_namespace, group_by_node, group_resources_by_kind, summarize, HealthRollup,
    NamespaceGroup, NamespaceGroups, NodeGroups, ResourceKindGroup,
};
use crate::collector::DataOrigin;
use crate::models::{Cluster, Pod, PodPhase, Resource};
use chrono::{DateTime, Utc};
use html::{dom_id, health_class};
use std::fmt::{self, Write};

const STYLE: &str = include_str!("dashboard.css");

/// Everything the document shows, derived from one collection
pub struct DashboardView<'a> {
    pub generated_at: DateTime<Utc>,
    pub cluster: Option<&'a Cluster>,
    pub resources: &'a [Resource],
    pub pods: &'a [Pod],
    pub origin: &'a DataOrigin,
    pub summary: HealthRollup,
    pub namespaces: NamespaceGroups<'a>,
    pub nodes: NodeGroups<'a>,
    pub resource_kinds: Vec<ResourceKindGroup<'a>>,
}

impl<'a> DashboardView<'a> {
    pub fn new(
        generated_at: DateTime<Utc>,
        cluster: Option<&'a Cluster>,
        resources: &'a [Resource],
        pods: &'a [Pod],
        origin: &'a DataOrigin,
    ) -> Self {
        Self {
            generated_at,
            cluster,
            resources,
            pods,
            origin,
            summary: summarize(pods),
            namespaces: group_by_namespace(pods),
            nodes: group_by_node(pods),
            resource_kinds: group_resources_by_kind(resources),
        }
    }
}

/// Render a self-contained HTML document
pub fn render_dashboard(view: &DashboardView<'_>) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(16 * 1024);
    write_document(&mut out, view)?;
    Ok(out)
}

fn write_document(out: &mut String, view: &DashboardView<'_>) -> fmt::Result {
    let title = view
        .cluster
        .map(|c| format!("AKS Dashboard - {}", c.name))
        .unwrap_or_else(|| "AKS Dashboard".to_string());

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(
        out,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    )?;
    writeln!(out, "<title>{}</title>", esc(&title))?;
    writeln!(out, "<style>\n{}</style>", STYLE)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;

    writeln!(out, "<header class=\"page-header\">")?;
    writeln!(out, "<h1>{}</h1>", esc(&title))?;
    writeln!(
        out,
        "<p class=\"generated\">Generated {}</p>",
        esc(view.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))
    )?;
    writeln!(out, "</header>")?;

    if let DataOrigin::Fallback { reason } = view.origin {
        writeln!(
            out,
            "<div class=\"banner fallback\">Live pod data unavailable ({}). Showing demonstration data.</div>",
            esc(reason)
        )?;
    }

    writeln!(out, "<main>")?;
    write_cluster(out, view.cluster)?;
    write_summary(out, view)?;
    write_namespaces(out, &view.namespaces)?;
    write_nodes(out, &view.nodes)?;
    write_resource_kinds(out, &view.resource_kinds)?;
    write_resource_table(out, view.resources)?;
    writeln!(out, "</main>")?;

    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(())
}

fn write_cluster(out: &mut String, cluster: Option<&Cluster>) -> fmt::Result {
    writeln!(out, "<section class=\"panel cluster\">")?;
    writeln!(out, "<h2>Cluster</h2>")?;

    let Some(cluster) = cluster else {
        writeln!(out, "<p class=\"empty\">Cluster information unavailable.</p>")?;
        return writeln!(out, "</section>");
    };

    writeln!(out, "<dl class=\"details\">")?;
    let fqdn = cluster.fqdn.as_deref().unwrap_or("-");
    let rows: [(&str, &dyn fmt::Display); 8] = [
        ("Name", &cluster.name),
        ("Resource Group", &cluster.resource_group),
        ("Location", &cluster.location),
        ("Kubernetes Version", &cluster.kubernetes_version),
        ("Nodes", &cluster.node_count),
        ("VM Size", &cluster.vm_size),
        ("Power State", &cluster.power_state),
        ("FQDN", &fqdn),
    ];
    for (label, value) in rows {
        writeln!(out, "<dt>{}</dt><dd>{}</dd>", label, esc(value))?;
    }
    writeln!(out, "</dl>")?;
    writeln!(out, "</section>")
}

fn write_summary(out: &mut String, view: &DashboardView<'_>) -> fmt::Result {
    let s = &view.summary;
    writeln!(out, "<section class=\"panel summary\">")?;
    writeln!(out, "<div class=\"stats\">")?;
    let stats = [
        ("Resources", view.resources.len()),
        ("Namespaces", view.namespaces.len()),
        ("Nodes", view.nodes.len()),
        ("Pods", s.total_pods),
        ("Running Pods", s.healthy_pods),
        ("Containers", s.total_containers),
        ("Ready Containers", s.healthy_containers),
    ];
    for (label, value) in stats {
        write_stat(out, label, value)?;
    }
    writeln!(out, "</div>")?;
    writeln!(out, "</section>")
}

fn write_stat(out: &mut String, label: &str, value: usize) -> fmt::Result {
    writeln!(
        out,
        "<div class=\"stat\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>",
        value, label
    )
}

fn phase_class(phase: &PodPhase) -> &'static str {
    match phase {
        PodPhase::Running => "green",
        PodPhase::Failed => "red",
        _ => "yellow",
    }
}

fn write_namespaces(out: &mut String, groups: &NamespaceGroups<'_>) -> fmt::Result {
    writeln!(out, "<section class=\"panel namespaces\">")?;
    writeln!(out, "<h2>Pods by Namespace</h2>")?;

    if groups.is_empty() {
        writeln!(out, "<p class=\"empty\">No pods found.</p>")?;
        return writeln!(out, "</section>");
    }

    for group in groups {
        write_namespace(out, group)?;
    }
    writeln!(out, "</section>")
}

fn write_namespace(out: &mut String, group: &NamespaceGroup<'_>) -> fmt::Result {
    let r = &group.rollup;
    let class = health_class(group.is_healthy());

    writeln!(
        out,
        "<details class=\"namespace {}\" id=\"{}\">",
        class,
        esc(dom_id("ns", group.namespace))
    )?;
    writeln!(
        out,
        "<summary><span class=\"indicator {}\"></span>Namespace: {} ({} pods) <span class=\"count\">{} containers</span></summary>",
        class,
        esc(group.namespace),
        r.total_pods,
        r.total_containers
    )?;

    writeln!(out, "<div class=\"stats\">")?;
    write_stat(out, "Total Pods", r.total_pods)?;
    write_stat(out, "Healthy Pods", r.healthy_pods)?;
    write_stat(out, "Total Containers", r.total_containers)?;
    write_stat(out, "Healthy Containers", r.healthy_containers)?;
    write_stat(out, "Unhealthy Pods", r.unhealthy_pods())?;
    writeln!(out, "</div>")?;

    for pod in &group.pods {
        write_pod(out, pod)?;
    }
    writeln!(out, "</details>")
}

fn write_pod(out: &mut String, pod: &Pod) -> fmt::Result {
    let readiness = pod.readiness();
    let node = pod.node.as_deref().unwrap_or("Unknown");

    writeln!(out, "<div class=\"pod\">")?;
    writeln!(
        out,
        "<div class=\"pod-name\"><span class=\"dot {}\"></span>{} <span class=\"badge\">{}</span></div>",
        phase_class(&pod.phase),
        esc(&pod.name),
        esc(&pod.phase)
    )?;
    writeln!(
        out,
        "<dl class=\"details\"><dt>Namespace</dt><dd>{}</dd><dt>Ready</dt><dd>{}/{}</dd><dt>Node</dt><dd>{}</dd><dt>Age</dt><dd>{}</dd></dl>",
        esc(&pod.namespace),
        readiness.ready,
        readiness.total,
        esc(node),
        esc(pod.age)
    )?;

    if !pod.containers.is_empty() {
        writeln!(out, "<ul class=\"containers\">")?;
        for c in &pod.containers {
            let ports = c
                .ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let limits = c
                .limits
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                out,
                "<li><span class=\"dot {}\"></span><strong>{}</strong> <small>Image: {} | Status: {} | Restarts: {}{}{}</small></li>",
                if c.ready { "green" } else { "red" },
                esc(&c.name),
                esc(&c.image),
                esc(&c.state),
                c.restart_count,
                if ports.is_empty() { String::new() } else { format!(" | Ports: {}", esc(&ports)) },
                if limits.is_empty() { String::new() } else { format!(" | Limits: {}", esc(&limits)) },
            )?;
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "</div>")
}

fn write_nodes(out: &mut String, nodes: &NodeGroups<'_>) -> fmt::Result {
    writeln!(out, "<section class=\"panel nodes\">")?;
    writeln!(out, "<h2>Pods by Node</h2>")?;

    if nodes.is_empty() {
        writeln!(out, "<p class=\"empty\">No pods found for node visualization.</p>")?;
        return writeln!(out, "</section>");
    }

    writeln!(out, "<div class=\"node-grid\">")?;
    for node in nodes {
        let class = health_class(node.is_healthy());
        writeln!(out, "<div class=\"node {}\">", class)?;
        writeln!(
            out,
            "<div class=\"node-header\"><h3>{}</h3><span class=\"badge\">{} pods</span><span class=\"badge\">{} containers</span><span class=\"indicator {}\"></span></div>",
            esc(node.node),
            node.rollup.total_pods,
            node.rollup.total_containers,
            class
        )?;

        for ns in &node.namespaces {
            let ns_class = health_class(ns.is_healthy());
            writeln!(out, "<div class=\"namespace-group {}\">", ns_class)?;
            writeln!(
                out,
                "<div class=\"namespace-label\"><span class=\"indicator {}\"></span><strong>{}</strong> ({} pods)</div>",
                ns_class,
                esc(ns.namespace),
                ns.rollup.total_pods
            )?;
            writeln!(out, "<ul class=\"pod-list\">")?;
            for pod in &ns.pods {
                writeln!(
                    out,
                    "<li><span class=\"dot {}\"></span>{} <small>({} containers)</small></li>",
                    phase_class(&pod.phase),
                    esc(&pod.name),
                    pod.containers.len()
                )?;
            }
            writeln!(out, "</ul>")?;
            writeln!(out, "</div>")?;
        }
        writeln!(out, "</div>")?;
    }
    writeln!(out, "</div>")?;
    writeln!(out, "</section>")
}

fn tag_list(resource: &Resource) -> String {
    if resource.tags.is_empty() {
        return "No tags".to_string();
    }
    resource
        .tags
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_resource_kinds(out: &mut String, kinds: &[ResourceKindGroup<'_>]) -> fmt::Result {
    if kinds.is_empty() {
        return Ok(());
    }

    writeln!(out, "<section class=\"panel inventory\">")?;
    writeln!(out, "<h2>Container Resources</h2>")?;
    for group in kinds {
        writeln!(
            out,
            "<h3>{} <span class=\"count\">{} items</span></h3>",
            esc(group.kind),
            group.resources.len()
        )?;
        writeln!(out, "<ul class=\"resource-list\">")?;
        for r in &group.resources {
            writeln!(
                out,
                "<li><strong>{}</strong> <small>{} | {} | {} | {}</small></li>",
                esc(&r.name),
                esc(&r.resource_type),
                esc(&r.location),
                esc(&r.resource_group),
                esc(tag_list(r))
            )?;
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "</section>")
}

fn write_resource_table(out: &mut String, resources: &[Resource]) -> fmt::Result {
    writeln!(out, "<section class=\"panel resources\">")?;
    writeln!(out, "<h2>All Resources ({})</h2>", resources.len())?;

    if resources.is_empty() {
        writeln!(out, "<p class=\"empty\">No resources found.</p>")?;
        return writeln!(out, "</section>");
    }

    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<thead><tr><th>Name</th><th>Type</th><th>Location</th><th>Resource Group</th><th>Tags</th></tr></thead>"
    )?;
    writeln!(out, "<tbody>")?;
    for r in resources {
        writeln!(
            out,
            "<tr><td><strong>{}</strong></td><td><span class=\"badge\">{}</span></td><td>{}</td><td>{}</td><td><small>{}</small></td></tr>",
            esc(&r.name),
            esc(r.kind()),
            esc(&r.location),
            esc(&r.resource_group),
            esc(tag_list(r))
        )?;
    }
    writeln!(out, "</tbody>")?;
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

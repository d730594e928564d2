use crate::routing::{AgentDomain, Distribution, HistoryStatistics, QueryPattern, RouteResponse, RoutingDecision};
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_warning(text: &str) {
    eprintln!("{}", text.yellow());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
}

/// One line per agent; `★` marks the selected one
pub fn distribution_lines<A: AgentDomain>(distribution: &Distribution<A>, selected: Option<A>) -> Vec<String> {
    distribution
        .to_percentages()
        .iter()
        .map(|(agent, percentage)| {
            let marker = if Some(agent) == selected { "★" } else { " " };
            let bar = "█".repeat((percentage / 5.0).round() as usize);
            format!("{} {} {:<16} {:>5.1}% {}", marker, agent.icon(), agent.id(), percentage, bar)
        })
        .collect()
}

pub fn print_distribution<A: AgentDomain>(title: &str, distribution: &Distribution<A>, selected: Option<A>) {
    println!("{}", title.bold());
    for line in distribution_lines(distribution, selected) {
        if line.starts_with('★') {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
}

pub fn print_route_response<A: AgentDomain>(response: &RouteResponse<A>) {
    let metadata = &response.metadata;
    let selected = response.selected_agent;

    print_header(&format!("{} {}", selected.icon(), selected.id()));
    println!("{}", response.reply.answer);
    println!();

    print_distribution(
        &format!("Weighted distribution (sample size {})", metadata.sample_size),
        &metadata.normalized_distribution,
        Some(selected),
    );
    println!();

    print_info(&format!("Source: {:?}", metadata.source));
    print_info(&format!("Weight preset: {}", metadata.weight_preset));
    print_info(&format!(
        "Outcome: {:?} via {:?} after {} attempt(s)",
        metadata.outcome, metadata.method, metadata.attempts
    ));
    print_info(&format!("Confidence: {:.2}", metadata.confidence));
    print_info(&format!("Reason: {}", metadata.reason));
    for warning in &metadata.warnings {
        print_warning(&format!("Warning: {}", warning));
    }
}

pub fn print_statistics<A: AgentDomain>(stats: &HistoryStatistics<A>) {
    print_header(&format!("Routing statistics ({} decisions)", stats.total));

    if stats.total == 0 {
        print_info("No routing decisions recorded yet");
        return;
    }

    if let (Some(first), Some(last)) = (stats.first_timestamp, stats.last_timestamp) {
        print_info(&format!("From {} to {}", first.to_rfc3339(), last.to_rfc3339()));
    }
    print_info(&format!("Uniform expectation: {:.1} per agent", stats.expected_per_agent));
    println!();

    for agent in &stats.agents {
        let confidence = agent
            .mean_confidence
            .map(|c| format!("{:.2}", c))
            .unwrap_or_else(|| "-".to_string());
        let deviation = format!("{:+.1}", agent.deviation);
        let deviation = if agent.deviation >= 0.0 { deviation.green() } else { deviation.red() };

        println!(
            "{} {:<16} {:>5} {:>6.1}%  conf {:>4}  dev {}",
            agent.agent.icon(),
            agent.agent.id(),
            agent.count,
            agent.percentage,
            confidence,
            deviation
        );
    }

    println!();
    print_info(&format!("Unique queries: {}", stats.unique_queries));
    for pattern in &stats.query_patterns {
        for line in query_pattern_lines(pattern) {
            println!("{}", line);
        }
    }
}

/// Query with its count, then one indented line per agent it went to
pub fn query_pattern_lines<A: AgentDomain>(pattern: &QueryPattern<A>) -> Vec<String> {
    std::iter::once(format!("'{}' ({}x)", pattern.query, pattern.total))
        .chain(pattern.agents.iter().map(|share| {
            format!(
                "  → {} {}: {} ({:.1}%)",
                share.agent.icon(),
                share.agent.id(),
                share.count,
                share.percentage
            )
        }))
        .collect()
}

pub fn print_history<A: AgentDomain>(records: &[RoutingDecision<A>]) {
    print_header(&format!("Recent decisions ({})", records.len()));
    for record in records {
        println!(
            "{} {} {} ({:.2}) {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            record.selected_agent.icon(),
            record.selected_agent.id().bold(),
            record.confidence,
            record.user_query
        );
    }
}

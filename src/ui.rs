use crate::board::{BoardResponse, Card, MemorySlot, Section, SkillView};
use crate::models::DataSource;
use std::fmt::Write;

pub fn render_index(board: &BoardResponse) -> String {
    INDEX_HTML
        .replace("{{API_STATUS}}", &escape(&board.status))
        .replace("{{AUTH_CLASS}}", if board.authenticated { "auth-on" } else { "auth-off" })
        .replace("{{AUTH_STATUS}}", board.auth_status)
        .replace("{{LEVEL}}", &board.player.level.to_string())
        .replace("{{XP}}", &group_digits(board.player.xp))
        .replace("{{PROGRESS}}", &board.player.progress_percent.to_string())
        .replace("{{COINS}}", &group_digits(board.player.coins))
        .replace("{{PORTFOLIO}}", &format!("${}", group_digits(board.player.portfolio_value)))
        .replace("{{TOTAL_XP}}", &group_digits(board.totals.total_xp))
        .replace("{{TOTAL_COINS}}", &group_digits(board.totals.total_coins))
        .replace("{{OPEN_ISSUES}}", &board.totals.open_issues.to_string())
        .replace("{{MEMORIES}}", &render_memories(&board.memories))
        .replace("{{SKILLS}}", &render_skills(&board.skills))
        .replace("{{NOTICE}}", &render_notice(board))
        .replace("{{TASKS}}", &render_tasks(board))
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn render_notice(board: &BoardResponse) -> String {
    match (board.source, &board.notice) {
        (DataSource::NotFetched, _) | (DataSource::Error, _) | (_, None) => String::new(),
        (DataSource::Live, Some(notice)) => format!(
            r#"<div id="partial-notice" class="cache-notice" data-source="live">&#9888; {}</div>"#,
            escape(notice)
        ),
        (_, Some(notice)) => format!(
            r#"<div id="cache-notice" class="cache-notice" data-source="{}">&#9888; {}</div>"#,
            source_name(board.source),
            escape(notice)
        ),
    }
}

fn source_name(source: DataSource) -> &'static str {
    match source {
        DataSource::NotFetched => "not_fetched",
        DataSource::Live => "live",
        DataSource::Cached => "cached",
        DataSource::Mock => "mock",
        DataSource::Error => "error",
    }
}

fn render_tasks(board: &BoardResponse) -> String {
    if board.source == DataSource::Error {
        return render_error_panel(board);
    }
    if board.source == DataSource::NotFetched {
        return r#"<div class="loading">Summoning quests from GitHub...</div>"#.to_string();
    }
    if board.sections.is_empty() {
        return r#"<div class="empty">No open quests remain.</div>"#.to_string();
    }
    board.sections.iter().map(render_section).collect()
}

fn render_error_panel(board: &BoardResponse) -> String {
    let reason = board.error.as_deref().unwrap_or("unknown error");
    let (heading, detail) = match &board.respawn_at {
        Some(at) => (
            "YOU DIED",
            format!(
                r#"<p class="rate-limit">GitHub Rate Limit: 0/{}</p>
  <p class="respawn-time">Respawn at: {}</p>"#,
                board.hourly_limit,
                escape(at)
            ),
        ),
        None => ("CONNECTION LOST", String::new()),
    };
    let token_hint = if board.authenticated {
        ""
    } else {
        r#"<p class="token-hint">Add a GitHub token to increase limit to 5000/hour</p>"#
    };
    format!(
        r#"<div class="error souls-error">
  <div class="death-message">{heading}</div>
  <div class="error-subtitle">The link of fire grows dim...</div>
  <p>{reason}</p>
  {detail}
  {token_hint}
  <form id="token-form" class="token-form">
    <input type="password" id="token-input" placeholder="Paste GitHub token here" autocomplete="off" />
    <button class="btn-claim" type="submit">Save Token</button>
  </form>
  <div class="retry-hint">Rest at the bonfire to try again</div>
  <form method="post" action="/refresh"><button class="btn-retry" type="submit">Light Bonfire</button></form>
</div>"#,
        reason = escape(reason),
    )
}

fn render_section(section: &Section) -> String {
    let cards: String = section.cards.iter().map(render_card).collect();
    format!(
        r#"<div class="task-section {tag}-section" data-type="{tag}">
  <h3 class="section-title">{title} ({count})</h3>
  <div class="task-grid">{cards}</div>
</div>"#,
        tag = section.tag,
        title = section.title,
        count = section.cards.len(),
    )
}

fn render_card(card: &Card) -> String {
    let mut labels = String::new();
    for label in &card.labels {
        let _ = write!(
            labels,
            r##"<span class="label" style="background-color: #{}">{}</span>"##,
            escape(&label.color),
            escape(&label.name)
        );
    }
    format!(
        r#"<div class="task-card" data-issue-id="{number}" data-sprint="{sprint}">
  <div class="task-header">
    <span class="task-number">#{number}</span>
    <span class="task-sprint sprint-{sprint}">Sprint {sprint}</span>
  </div>
  <h4 class="task-title">{title}</h4>
  <div class="task-rewards">
    <span class="xp-reward">&#127775; {xp} XP</span>
    <span class="coin-reward">&#129689; {coins} coins</span>
  </div>
  <div class="task-labels">{labels}</div>
  <div class="task-actions">
    <button class="btn-claim" type="button" data-action="claim" data-issue="{number}">Claim Task</button>
    <button class="btn-complete" type="button" data-action="complete" data-issue="{number}">Complete</button>
    <a href="{url}" target="_blank" rel="noopener" class="btn-view">View on GitHub</a>
  </div>
</div>"#,
        number = card.number,
        sprint = card.sprint,
        title = escape(&card.title),
        xp = card.xp,
        coins = card.coins,
        url = escape(&card.html_url),
    )
}

fn render_memories(memories: &[MemorySlot]) -> String {
    memories
        .iter()
        .map(|slot| {
            if slot.unlocked {
                format!(
                    r#"<div class="memory-fragment unlocked" data-memory="{id}"><div class="memory-number">{id}</div><div class="memory-title">Memory #{id}</div></div>"#,
                    id = slot.id
                )
            } else {
                format!(
                    r#"<div class="memory-fragment locked"><div class="memory-number">{id}</div><div class="memory-locked">&#128274;</div></div>"#,
                    id = slot.id
                )
            }
        })
        .collect()
}

fn render_skills(skills: &[SkillView]) -> String {
    skills
        .iter()
        .map(|skill| {
            format!(
                r#"<div class="skill-track"><h4>{name}</h4><div class="skill-progress"><div class="skill-bar" style="width: {percent}%"></div></div><span class="skill-level">{tier}</span></div>"#,
                name = skill.name,
                percent = skill.percent,
                tier = skill.tier,
            )
        })
        .collect()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Shadowed Realms Quest Board</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Cinzel:wght@500;700&family=Inter:wght@400;600&display=swap');

    :root {
      --abyss: #0f0d0c;
      --ash: #1c1917;
      --stone: #2a2522;
      --bone: #f0f0f0;
      --ember-orange: #c2571a;
      --garden-gold: #d4a94f;
      --blood-red: #8b1a1a;
      --moss: #6b9b7e;
      --shadow: 0 18px 48px rgba(0, 0, 0, 0.55);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, #2b1a12, transparent 55%),
        linear-gradient(160deg, var(--abyss), var(--ash) 70%);
      color: var(--bone);
      font-family: "Inter", "Trebuchet MS", sans-serif;
      padding: 28px 18px 48px;
    }

    .app {
      width: min(1180px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
    }

    h1, h2, h3 {
      font-family: "Cinzel", "Georgia", serif;
      margin: 0;
    }

    h1 {
      font-size: clamp(1.8rem, 4vw, 2.6rem);
      color: var(--garden-gold);
    }

    .api-status {
      padding: 6px 14px;
      border-radius: 999px;
      background: var(--stone);
      font-size: 0.9rem;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(170px, 1fr));
      gap: 14px;
    }

    .stat {
      background: var(--stone);
      border-radius: 14px;
      padding: 16px;
      box-shadow: var(--shadow);
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #a39a90;
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 600;
      color: var(--garden-gold);
    }

    .xp-bar {
      height: 10px;
      border-radius: 999px;
      background: var(--ash);
      overflow: hidden;
    }

    #xp-progress {
      height: 100%;
      background: linear-gradient(90deg, var(--ember-orange), var(--garden-gold));
    }

    .filters {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
    }

    .filters select, .filters input {
      background: var(--stone);
      color: var(--bone);
      border: 1px solid #3d3531;
      border-radius: 8px;
      padding: 8px 12px;
    }

    .auth-on { color: var(--moss); }
    .auth-off { color: #994444; }

    .token-form {
      display: flex;
      justify-content: center;
      gap: 8px;
      margin-top: 20px;
    }

    .token-form input {
      width: min(300px, 100%);
      padding: 10px;
      border-radius: 6px;
      border: 1px solid #3d3531;
      background: var(--ash);
      color: var(--bone);
    }

    .cache-notice {
      background: var(--ember-orange);
      color: #f0f0f0;
      padding: 10px;
      border-radius: 4px;
      text-align: center;
    }

    .task-section {
      display: grid;
      gap: 12px;
      margin-bottom: 18px;
    }

    .task-grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(260px, 1fr));
      gap: 12px;
    }

    .task-card {
      background: var(--stone);
      border-radius: 12px;
      padding: 14px;
      display: grid;
      gap: 8px;
      border: 1px solid #3d3531;
    }

    .task-header, .task-rewards, .task-actions {
      display: flex;
      justify-content: space-between;
      gap: 8px;
      font-size: 0.85rem;
    }

    .task-title {
      margin: 0;
      font-size: 1rem;
    }

    .label {
      display: inline-block;
      margin: 2px;
      padding: 2px 8px;
      border-radius: 999px;
      font-size: 0.72rem;
      color: #111;
    }

    button, .btn-view {
      appearance: none;
      border: none;
      border-radius: 6px;
      padding: 6px 10px;
      font-weight: 600;
      cursor: pointer;
      font-size: 0.8rem;
      text-decoration: none;
    }

    .btn-claim { background: var(--garden-gold); color: #1c1917; }
    .btn-complete { background: var(--moss); color: #0f0d0c; }
    .btn-view { background: transparent; color: var(--garden-gold); border: 1px solid var(--garden-gold); }
    .btn-retry { margin-top: 20px; padding: 10px 20px; background: var(--ember-orange); color: white; }

    .souls-error {
      text-align: center;
      padding: 32px;
      border: 2px solid var(--blood-red);
      border-radius: 12px;
      background: rgba(139, 0, 0, 0.12);
    }

    .death-message {
      font-family: "Cinzel", serif;
      font-size: 2rem;
      color: var(--blood-red);
    }

    #memory-container {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(64px, 1fr));
      gap: 8px;
    }

    .memory-fragment {
      background: var(--stone);
      border-radius: 8px;
      padding: 8px;
      text-align: center;
      font-size: 0.75rem;
    }

    .memory-fragment.unlocked {
      border: 1px solid var(--garden-gold);
      cursor: pointer;
    }

    .memory-fragment.locked {
      opacity: 0.45;
    }

    #skills-container {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    .skill-progress {
      height: 8px;
      background: var(--ash);
      border-radius: 999px;
      overflow: hidden;
    }

    .skill-bar {
      height: 100%;
      background: var(--moss);
    }

    #memory-modal {
      display: none;
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.7);
      place-items: center;
    }

    #memory-modal .modal-content {
      background: var(--stone);
      padding: 28px;
      border-radius: 14px;
      max-width: 460px;
    }

    .reward-notification, .memory-unlock-notification {
      position: fixed;
      right: 20px;
      bottom: 20px;
      background: var(--stone);
      border: 1px solid var(--garden-gold);
      border-radius: 12px;
      padding: 14px 18px;
      box-shadow: var(--shadow);
      animation: rise 400ms ease;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Shadowed Realms Quest Board</h1>
      <div class="api-status" id="api-status">{{API_STATUS}} <span id="auth-status" class="{{AUTH_CLASS}}">{{AUTH_STATUS}}</span></div>
    </header>

    <section class="panel">
      <div class="stat">
        <span class="label">Level</span>
        <span id="user-level" class="value">{{LEVEL}}</span>
        <div class="xp-bar"><div id="xp-progress" style="width: {{PROGRESS}}%"></div></div>
      </div>
      <div class="stat">
        <span class="label">Experience</span>
        <span id="user-xp" class="value">{{XP}}</span>
      </div>
      <div class="stat">
        <span class="label">Coins</span>
        <span id="user-coins" class="value">{{COINS}}</span>
      </div>
      <div class="stat">
        <span class="label">Portfolio</span>
        <span id="portfolio-value" class="value">{{PORTFOLIO}}</span>
      </div>
    </section>

    <section class="panel">
      <div class="stat">
        <span class="label">XP available</span>
        <span id="total-xp" class="value">{{TOTAL_XP}}</span>
      </div>
      <div class="stat">
        <span class="label">Coins available</span>
        <span id="total-coins" class="value">{{TOTAL_COINS}}</span>
      </div>
      <div class="stat">
        <span class="label">Open quests</span>
        <span id="open-issues" class="value">{{OPEN_ISSUES}}</span>
      </div>
    </section>

    <section class="filters">
      <select id="sprint-filter">
        <option value="all">All sprints</option>
        <option value="1">Sprint 1</option>
        <option value="2">Sprint 2</option>
        <option value="3">Sprint 3</option>
        <option value="4">Sprint 4</option>
      </select>
      <select id="type-filter">
        <option value="all">All types</option>
        <option value="epic-section">Epics</option>
        <option value="user-story-section">User Stories</option>
        <option value="task-section">Tasks</option>
        <option value="micro-task-section">Micro-Tasks</option>
        <option value="documentation-section">Documentation</option>
        <option value="core-systems-section">Core Systems</option>
        <option value="combat-section">Combat</option>
        <option value="environment-section">Environment</option>
        <option value="ui-ux-section">UI / UX</option>
        <option value="save-system-section">Save System</option>
        <option value="audio-polish-section">Audio &amp; Polish</option>
      </select>
      <input id="task-search" type="search" placeholder="Search quests..." />
      <form method="post" action="/refresh"><button class="btn-claim" type="submit">Refresh</button></form>
    </section>

    {{NOTICE}}
    <section id="task-list">{{TASKS}}</section>

    <section>
      <h2>Memory Fragments</h2>
      <div id="memory-container">{{MEMORIES}}</div>
    </section>

    <section>
      <h2>Skill Specializations</h2>
      <div id="skills-container">{{SKILLS}}</div>
    </section>
  </main>

  <div id="memory-modal"></div>

  <script>
    const notify = (note) => {
      const el = document.createElement('div');
      el.className = note.kind === 'memory' ? 'memory-unlock-notification' : 'reward-notification';
      const title = document.createElement('h3');
      title.textContent = note.title;
      const body = document.createElement('p');
      body.textContent = note.body;
      el.append(title, body);
      document.body.appendChild(el);
      setTimeout(() => el.remove(), note.duration_ms);
    };

    const failure = async (res) => {
      const msg = await res.text();
      notify({ kind: 'error', title: 'The quest failed', body: msg || res.statusText, duration_ms: 4000 });
    };

    const completeTask = async (issue) => {
      const res = await fetch(`/api/tasks/${issue}/complete`, { method: 'POST' });
      if (!res.ok) {
        return failure(res);
      }
      const data = await res.json();
      data.notifications.forEach(notify);
      setTimeout(() => window.location.reload(), 1500);
    };

    const claimTask = async (issue) => {
      const res = await fetch(`/api/tasks/${issue}/claim`, { method: 'POST' });
      if (!res.ok) {
        return failure(res);
      }
      const data = await res.json();
      notify({ kind: 'reward', title: 'Quest claimed', body: data.message, duration_ms: 3000 });
    };

    const showMemory = async (id) => {
      const res = await fetch(`/api/memories/${id}`);
      if (!res.ok) {
        return failure(res);
      }
      const memory = await res.json();
      const modal = document.getElementById('memory-modal');
      modal.innerHTML = '<div class="modal-content"><h2></h2><p class="memory-story"></p><button type="button">Close</button></div>';
      modal.querySelector('h2').textContent = memory.title;
      modal.querySelector('.memory-story').textContent = memory.story;
      modal.querySelector('button').addEventListener('click', () => { modal.style.display = 'none'; });
      modal.style.display = 'grid';
    };

    document.getElementById('task-list').addEventListener('click', (event) => {
      const button = event.target.closest('button[data-action]');
      if (!button) {
        return;
      }
      const issue = button.dataset.issue;
      if (button.dataset.action === 'complete') {
        completeTask(issue);
      } else {
        claimTask(issue);
      }
    });

    document.getElementById('memory-container').addEventListener('click', (event) => {
      const fragment = event.target.closest('.memory-fragment.unlocked');
      if (fragment) {
        showMemory(fragment.dataset.memory);
      }
    });

    const saveToken = async (event) => {
      event.preventDefault();
      const token = document.getElementById('token-input').value.trim();
      if (!token) {
        return;
      }
      const res = await fetch('/api/token', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ token }),
      });
      if (!res.ok) {
        return failure(res);
      }
      window.location.reload();
    };

    const tokenForm = document.getElementById('token-form');
    if (tokenForm) {
      tokenForm.addEventListener('submit', saveToken);
    }

    const applyCardFilters = () => {
      const sprint = document.getElementById('sprint-filter').value;
      const query = document.getElementById('task-search').value.toLowerCase();
      document.querySelectorAll('.task-card').forEach((card) => {
        const title = card.querySelector('.task-title').textContent.toLowerCase();
        const sprintMatch = sprint === 'all' || card.dataset.sprint === sprint;
        card.style.display = sprintMatch && title.includes(query) ? '' : 'none';
      });
    };

    document.getElementById('sprint-filter').addEventListener('change', applyCardFilters);

    document.getElementById('type-filter').addEventListener('change', (event) => {
      const type = event.target.value;
      document.querySelectorAll('.task-section').forEach((section) => {
        section.style.display = type === 'all' || section.classList.contains(type) ? '' : 'none';
      });
    });

    document.getElementById('task-search').addEventListener('input', applyCardFilters);
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::FeedOutcome;
    use crate::board::build_board;
    use crate::mock;
    use crate::models::{IssueState, UserStats};
    use crate::state::Feed;

    fn page(outcome: FeedOutcome, issues: Vec<crate::models::Issue>) -> String {
        let feed = Feed {
            outcome: Some(outcome),
            issues,
        };
        render_index(&build_board(&feed, &UserStats::default(), false))
    }

    #[test]
    fn live_page_has_no_cache_banner() {
        let html = page(
            FeedOutcome::Live { partial: false },
            mock::generate(1..=3, IssueState::Open, "o", "r"),
        );
        assert!(!html.contains("id=\"cache-notice\""));
        assert!(html.contains("Live (3 issues)"));
        assert!(html.contains("data-issue-id=\"2\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn cached_page_shows_banner() {
        let html = page(
            FeedOutcome::Cached { age_ms: 120_000 },
            mock::generate(1..=3, IssueState::Open, "o", "r"),
        );
        assert!(html.contains("id=\"cache-notice\""));
        assert!(html.contains("data-source=\"cached\""));
        assert!(html.contains("Showing 3 real project issues"));
    }

    #[test]
    fn partial_live_page_warns_without_cache_banner() {
        let html = page(
            FeedOutcome::Live { partial: true },
            mock::generate(1..=3, IssueState::Open, "o", "r"),
        );
        assert!(html.contains("id=\"partial-notice\""));
        assert!(!html.contains("id=\"cache-notice\""));
    }

    #[test]
    fn failed_page_offers_retry() {
        let html = page(
            FeedOutcome::Failed {
                reason: "network error: connection refused".into(),
                rate_limit_reset: None,
            },
            Vec::new(),
        );
        assert!(html.contains("CONNECTION LOST"));
        assert!(html.contains("action=\"/refresh\""));
        assert!(!html.contains("id=\"cache-notice\""));
        assert!(!html.contains("Respawn at"));
    }

    #[test]
    fn rate_limited_page_shows_respawn_time_and_token_form() {
        let html = page(
            FeedOutcome::Failed {
                reason: "rate limited by GitHub".into(),
                rate_limit_reset: Some(1_700_000_000),
            },
            Vec::new(),
        );
        assert!(html.contains("YOU DIED"));
        assert!(html.contains("GitHub Rate Limit: 0/60"));
        assert!(html.contains("Respawn at: 22:13:20 UTC"));
        assert!(html.contains("id=\"token-input\""));
        assert!(html.contains("type=\"password\""));
        assert!(html.contains("fetch('/api/token'"));
        assert!(html.contains("No Auth (60/hr)"));
    }

    #[test]
    fn authenticated_status_is_shown() {
        let feed = Feed {
            outcome: Some(FeedOutcome::Live { partial: false }),
            issues: mock::generate(1..=2, IssueState::Open, "o", "r"),
        };
        let html = render_index(&build_board(&feed, &UserStats::default(), true));
        assert!(html.contains("Authenticated (5000/hr)"));
        assert!(html.contains("class=\"auth-on\""));
    }

    #[test]
    fn card_filters_combine_sprint_and_search() {
        let html = page(FeedOutcome::Mock, mock::generate(1..=2, IssueState::Open, "o", "r"));
        assert!(html.contains("const applyCardFilters"));
        assert!(html.contains("addEventListener('change', applyCardFilters)"));
        assert!(html.contains("addEventListener('input', applyCardFilters)"));
    }

    #[test]
    fn issue_text_is_escaped() {
        let mut issues = mock::generate(1..=1, IssueState::Open, "o", "r");
        issues[0].title = "<script>alert('x')</script>".into();
        let html = page(FeedOutcome::Live { partial: false }, issues);
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn digits_are_grouped() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }
}

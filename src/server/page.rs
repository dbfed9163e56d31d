use super::util::{html_escape, script_json};
use super::ListResponse;

const CSS: &str = r#"* { margin: 0; padding: 0; box-sizing: border-box; }
html, body { width: 100%; height: 100%; background: #0A0A0A; color: #A0A0A0;
  font-family: 'JetBrains Mono', monospace; font-size: 12px; }
.toolbar {
  height: 36px; display: flex; align-items: center; padding: 0 14px;
  border-bottom: 1px solid #2A2A2A; gap: 10px; user-select: none;
}
.toolbar .label { color: #666; }
.toolbar .doc { color: #D4AF37; font-weight: 600; }
.toolbar .badge { background: #1F1F1F; padding: 2px 8px; border-radius: 3px; font-size: 10px; }
.search {
  width: calc(100% - 28px); margin: 10px 14px; padding: 5px 8px;
  background: #141414; border: 1px solid #2A2A2A; color: #DDD;
  font-family: inherit; font-size: 12px; border-radius: 3px; outline: none;
}
.search:focus { border-color: #D4AF37; }
.entries { list-style: none; padding: 0 14px; }
.entries li {
  padding: 4px 8px; cursor: pointer; border-left: 2px solid transparent;
  white-space: nowrap; overflow: hidden; text-overflow: ellipsis;
}
.entries li:hover { color: #FFF; border-left-color: #D4AF37; background: #141414; }
.entries li.selected { color: #D4AF37; border-left-color: #D4AF37; }
.empty { padding: 8px 22px; color: #444; }
.block {
  margin: 10px 14px; padding: 12px; background: #141414; border-radius: 4px;
  border-left: 3px solid #D4AF37; white-space: pre; overflow: auto; color: #CCC;
}
.block:empty { display: none; }
.notice { margin: 6px 14px; color: #22C55E; font-size: 11px; }"#;

/// The panel: filter box, list, and the revealed block.
pub(super) fn build_panel_page(list: &ListResponse, filter: &str, nonce: &str) -> String {
    let document = list
        .document
        .as_ref()
        .map(|d| html_escape(d.as_str()))
        .unwrap_or_else(|| "no document".to_string());
    let initial = script_json(list);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; style-src 'nonce-{nonce}'; script-src 'nonce-{nonce}' 'self'; connect-src 'self';">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Media Queries — {document}</title>
<style nonce="{nonce}">
{css}
</style>
</head>
<body>
<div class="toolbar">
  <span class="label">media queries</span>
  <span class="doc">{document}</span>
  <span class="badge" id="count"></span>
</div>
<input type="text" class="search" id="search" placeholder="Type here" value="{filter}" autocomplete="off">
<ul class="entries" id="entries"></ul>
<div class="notice" id="notice"></div>
<pre class="block" id="block"></pre>
<script nonce="{nonce}">
(function () {{
  const input = document.getElementById('search');
  const list = document.getElementById('entries');
  const count = document.getElementById('count');
  const block = document.getElementById('block');
  const notice = document.getElementById('notice');

  function render(state) {{
    list.replaceChildren();
    count.textContent = state.items.length + (state.filtering ? ' shown' : ' total');
    if (state.items.length === 0) {{
      const li = document.createElement('li');
      li.className = 'empty';
      li.textContent = state.document ? 'no media queries' : 'no document';
      list.appendChild(li);
      return;
    }}
    state.items.forEach(item => {{
      const li = document.createElement('li');
      li.textContent = item.label;
      li.addEventListener('click', () => reveal(item.target, li));
      list.appendChild(li);
    }});
  }}

  function handle(outbound) {{
    outbound.forEach(message => {{
      switch (message.kind) {{
        case 'clear':
          input.value = '';
          break;
      }}
    }});
  }}

  function post(message) {{
    return fetch('/message', {{
      method: 'POST',
      headers: {{ 'Content-Type': 'application/json' }},
      body: JSON.stringify(message),
    }}).then(r => r.json()).then(res => {{
      render(res.list);
      handle(res.outbound);
      notice.textContent = res.notices.join(' ');
    }});
  }}

  function reveal(target, li) {{
    fetch('/reveal', {{
      method: 'POST',
      headers: {{ 'Content-Type': 'application/json' }},
      body: JSON.stringify(target),
    }}).then(r => r.json()).then(res => {{
      list.querySelectorAll('li').forEach(el => el.classList.remove('selected'));
      if (res.selection) {{
        li.classList.add('selected');
        block.textContent = res.selection.text;
      }} else {{
        block.textContent = '';
      }}
    }});
  }}

  input.addEventListener('input', () => {{
    post({{ kind: 'filter-text', value: input.value.toLowerCase() }});
  }});

  render({initial});
}}());
</script>
</body>
</html>"##,
        nonce = nonce,
        document = document,
        css = CSS,
        filter = html_escape(filter),
        initial = initial,
    )
}

use crate::config::{Config, Variant, POLY_ORDER_RANGE, WINDOW_LENGTH_RANGE, WINDOW_LENGTH_STEP};

pub fn render_index(config: &Config) -> String {
    let hidden = match config.variant {
        Variant::Tunable => "",
        Variant::Fixed => "hidden",
    };
    INDEX_HTML
        .replace("{{VARIANT}}", config.variant.as_str())
        .replace("{{SLIDERS_HIDDEN}}", hidden)
        .replace("{{POLY_MIN}}", &POLY_ORDER_RANGE.0.to_string())
        .replace("{{POLY_MAX}}", &POLY_ORDER_RANGE.1.to_string())
        .replace("{{POLY}}", &config.params.poly_order.to_string())
        .replace("{{WINDOW_MIN}}", &WINDOW_LENGTH_RANGE.0.to_string())
        .replace("{{WINDOW_MAX}}", &WINDOW_LENGTH_RANGE.1.to_string())
        .replace("{{WINDOW_STEP}}", &WINDOW_LENGTH_STEP.to_string())
        .replace("{{WINDOW}}", &config.params.window_length.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>COVID-19 rates in countries</title>
  <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
  <style>
    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --muted: #5f5c57;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1120px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      text-align: center;
      margin: 0;
    }

    .controls {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
      gap: 18px;
    }

    .controls[hidden] {
      display: none;
    }

    label {
      font-weight: 600;
      display: block;
      margin-bottom: 6px;
    }

    select {
      width: 100%;
      min-height: 160px;
    }

    .status {
      color: var(--muted);
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #b42318;
    }
  </style>
</head>
<body data-variant="{{VARIANT}}">
  <main class="app">
    <h1>COVID-19 rates in countries</h1>

    <section>
      <label for="selection">Countries</label>
      <select id="selection" multiple></select>
    </section>

    <section class="controls" id="sliders" {{SLIDERS_HIDDEN}}>
      <div>
        <label for="poly">Polynomial order: <span id="poly-value">{{POLY}}</span></label>
        <input id="poly" type="range" min="{{POLY_MIN}}" max="{{POLY_MAX}}" step="1" value="{{POLY}}" />
      </div>
      <div>
        <label for="window">Window length: <span id="window-value">{{WINDOW}}</span></label>
        <input id="window" type="range" min="{{WINDOW_MIN}}" max="{{WINDOW_MAX}}" step="{{WINDOW_STEP}}" value="{{WINDOW}}" />
      </div>
    </section>

    <div class="status" id="status"></div>

    <div id="cumulative"></div>
    <div id="daily-new"></div>
    <div id="derivative"></div>
  </main>

  <script>
    const selectionEl = document.getElementById('selection');
    const polyEl = document.getElementById('poly');
    const windowEl = document.getElementById('window');
    const polyValueEl = document.getElementById('poly-value');
    const windowValueEl = document.getElementById('window-value');
    const statusEl = document.getElementById('status');
    const tunable = document.body.dataset.variant === 'tunable';

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const selected = () => Array.from(selectionEl.selectedOptions).map((option) => option.value);

    const loadCountries = async () => {
      const res = await fetch('/api/countries');
      if (!res.ok) {
        throw new Error('Unable to load countries');
      }
      const data = await res.json();
      const defaults = new Set(data.default_selection);
      selectionEl.innerHTML = '';
      data.countries.forEach((name) => {
        const option = document.createElement('option');
        option.value = name;
        option.textContent = name;
        option.selected = defaults.has(name);
        selectionEl.appendChild(option);
      });
    };

    const refresh = async () => {
      const body = { countries: selected() };
      if (tunable) {
        body.poly_order = Number(polyEl.value);
        body.window_length = Number(windowEl.value);
      }
      const res = await fetch('/api/charts', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body)
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      const specs = await res.json();
      Plotly.react('cumulative', specs.cumulative.data, specs.cumulative.layout);
      Plotly.react('daily-new', specs.daily_new.data, specs.daily_new.layout);
      Plotly.react('derivative', specs.derivative.data, specs.derivative.layout);

      if (specs.skipped.length) {
        const names = specs.skipped.map((skip) => skip.country).join(', ');
        setStatus(`Not enough data to smooth: ${names}`, 'info');
      } else {
        setStatus('', '');
      }
    };

    const update = () => refresh().catch((err) => setStatus(err.message, 'error'));

    selectionEl.addEventListener('change', update);
    polyEl.addEventListener('input', () => {
      polyValueEl.textContent = polyEl.value;
      update();
    });
    windowEl.addEventListener('input', () => {
      windowValueEl.textContent = windowEl.value;
      update();
    });

    loadCountries()
      .then(refresh)
      .catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;

//! Page shells. Data is loaded by the browser through `/api/*`.

use axum::{extract::Query, response::Html};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{models::Role, session::ROLE_COOKIE};

// Envía un formulario como JSON al endpoint indicado
const FORM_SCRIPT: &str = r#"
document.querySelectorAll('form[data-endpoint]').forEach((form) => {
  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    const notice = form.querySelector('.notice');
    const res = await fetch(form.dataset.endpoint, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(Object.fromEntries(new FormData(form))),
    });
    const body = await res.json().catch(() => ({}));
    if (res.ok) { window.location.href = form.dataset.redirect; return; }
    notice.textContent = body.error || 'Error';
  });
});
"#;

const PRODUCTS_SCRIPT: &str = r#"
let page = 1;
async function load(target) {
  const res = await fetch(`/api/products?page=${target}`);
  const body = await res.json().catch(() => ({}));
  const notice = document.getElementById('notice');
  if (!res.ok) { notice.textContent = body.error || 'Error al cargar productos'; return; }
  page = body.pagination.current_page;
  document.getElementById('rows').innerHTML = body.data.map((p) =>
    `<tr><td>${p.sku}</td><td>${p.name}</td><td>${p.category}</td><td>${p.price}</td><td>${p.stock}</td><td>${p.status}</td></tr>`
  ).join('');
  document.getElementById('page').textContent = `${page} / ${body.pagination.last_page}`;
  document.getElementById('prev').disabled = page <= 1;
  document.getElementById('next').disabled = page >= body.pagination.last_page;
}
document.getElementById('prev').onclick = () => load(page - 1);
document.getElementById('next').onclick = () => load(page + 1);
document.getElementById('logout').onclick = async () => {
  await fetch('/api/auth/logout', { method: 'POST' });
  window.location.href = '/login';
};
load(1);
"#;

fn layout(title: &str, body: &str, script: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html lang=\"es\"><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body>{body}<script>{script}</script></body></html>"
    ))
}

pub async fn landing() -> Html<String> {
    layout(
        "Inventario",
        "<header><h1>Controla tu inventario en un solo lugar</h1>\
         <nav><a href=\"/login\">Iniciar sesión</a> <a href=\"/register\">Crear cuenta</a></nav></header>",
        "",
    )
}

pub async fn login_page() -> Html<String> {
    layout(
        "Iniciar sesión",
        "<form data-endpoint=\"/api/auth\" data-redirect=\"/dashboard\">\
         <input name=\"email\" type=\"email\" required>\
         <input name=\"password\" type=\"password\" required>\
         <button type=\"submit\">Entrar</button><p class=\"notice\"></p></form>\
         <a href=\"/register\">Crear cuenta</a>",
        FORM_SCRIPT,
    )
}

pub async fn register_page() -> Html<String> {
    layout(
        "Crear cuenta",
        "<form data-endpoint=\"/api/auth/register\" data-redirect=\"/login\">\
         <input name=\"username\" required>\
         <input name=\"email\" type=\"email\" required>\
         <input name=\"password\" type=\"password\" required>\
         <input name=\"password_confirmation\" type=\"password\" required>\
         <button type=\"submit\">Registrarse</button><p class=\"notice\"></p></form>\
         <a href=\"/login\">Ya tengo cuenta</a>",
        FORM_SCRIPT,
    )
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub error: Option<String>,
}

/// Role badge. Display only; parsing through [`Role`] keeps the cookie out of the markup.
fn role_badge(jar: &CookieJar) -> Role {
    jar.get(ROLE_COOKIE)
        .map(|cookie| Role::parse(cookie.value()))
        .unwrap_or_default()
}

pub async fn dashboard_page(jar: CookieJar, Query(query): Query<DashboardQuery>) -> Html<String> {
    let notice = match query.error.as_deref() {
        Some("unauthorized") => "No tienes permiso para acceder a esa sección",
        _ => "",
    };

    layout(
        "Productos",
        &format!(
            "<nav><span class=\"badge\">{role}</span> <a href=\"/dashboard/profile\">Perfil</a> \
             <button id=\"logout\">Cerrar sesión</button></nav>\
             <p id=\"notice\">{notice}</p>\
             <table><thead><tr><th>SKU</th><th>Nombre</th><th>Categoría</th><th>Precio</th>\
             <th>Stock</th><th>Estado</th></tr></thead><tbody id=\"rows\"></tbody></table>\
             <button id=\"prev\">Anterior</button> <span id=\"page\"></span> <button id=\"next\">Siguiente</button>",
            role = role_badge(&jar),
        ),
        PRODUCTS_SCRIPT,
    )
}

pub async fn profile_page(jar: CookieJar) -> Html<String> {
    layout(
        "Perfil",
        &format!(
            "<nav><span class=\"badge\">{}</span> <a href=\"/dashboard\">Productos</a></nav>\
             <dl id=\"profile\"></dl>",
            role_badge(&jar)
        ),
        "fetch('/api/profile').then((r) => r.json()).then((body) => {\
           const user = body.data || {};\
           document.getElementById('profile').innerHTML = ['username', 'email', 'phone_number', 'role']\
             .map((k) => `<dt>${k}</dt><dd>${user[k] ?? ''}</dd>`).join('');\
         });",
    )
}

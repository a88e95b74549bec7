//! Offline backend returning a fixed document.

/// Response used when no custom text is configured.
pub const DEFAULT_MOCK_RESPONSE: &str = "## 📌 Resumen del cambio

Este es un PR de prueba generado por el cliente mock de prgen.
Los cambios incluyen mejoras en la arquitectura y refactorización del código principal.
Se optimizaron las consultas a la base de datos para mejorar el rendimiento.
Se implementaron nuevos endpoints en el controlador principal.
Se actualizaron las dependencias del proyecto a sus versiones más recientes.

## 🔍 ¿Qué problema soluciona?

Resuelve el problema de rendimiento en la generación de reportes grandes.
Reduce el tiempo de respuesta de la API en un 40%.

## 🚀 ¿Cómo probarlo?

1. Clona el repositorio y cambia a esta rama.
2. Ejecuta las migraciones con `php artisan migrate`.
3. Prueba el endpoint `GET /api/reports`.

## ⚠️ Consideraciones adicionales

Ninguna.
";

/// Returns a canned response without touching the network.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    response: Option<String>,
}

impl MockClient {
    /// Mock that always answers with `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    pub fn name(&self) -> String {
        "mock".to_string()
    }

    pub fn generate(&self, _prompt: &str) -> String {
        self.response
            .clone()
            .unwrap_or_else(|| DEFAULT_MOCK_RESPONSE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_and_custom_responses() {
        assert_eq!(MockClient::default().generate("x"), DEFAULT_MOCK_RESPONSE);
        assert_eq!(MockClient::with_response("feat: x").generate("y"), "feat: x");
    }

    #[test]
    fn default_response_has_all_sections() {
        for heading in [
            "## 📌 Resumen del cambio",
            "## 🔍 ¿Qué problema soluciona?",
            "## 🚀 ¿Cómo probarlo?",
            "## ⚠️ Consideraciones adicionales",
        ] {
            assert!(DEFAULT_MOCK_RESPONSE.contains(heading));
        }
    }
}

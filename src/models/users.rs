// src/models/users.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Usuário (cliente, assessor ou funcionário). A coleção pertence ao serviço
/// de usuários; aqui só lemos e, na varredura, completamos o cadastro no
/// Contifico.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub cedula: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub rol_name: Option<String>,
    pub id_contifico: Option<String>,
    pub reg_comp_rrss: Option<bool>,
}

impl User {
    pub fn rol(&self) -> &str {
        self.rol_name.as_deref().unwrap_or_default()
    }

    /// Cadastro completo para redes sociais: tem cédula ou é cliente final.
    pub fn registro_completo(&self) -> bool {
        self.cedula.is_some() || self.rol() == "Cliente"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(cedula: Option<&str>, rol: Option<&str>) -> User {
        User {
            id: Uuid::nil(),
            display_name: None,
            cedula: cedula.map(String::from),
            email: None,
            telefono: None,
            direccion: None,
            rol_name: rol.map(String::from),
            id_contifico: None,
            reg_comp_rrss: None,
        }
    }

    #[test]
    fn registro_completo_exige_cedula_ou_papel_de_cliente() {
        assert!(user(Some("0101"), Some("Asesor")).registro_completo());
        assert!(user(None, Some("Cliente")).registro_completo());
        assert!(!user(None, Some("Asesor")).registro_completo());
        assert!(!user(None, None).registro_completo());
    }
}

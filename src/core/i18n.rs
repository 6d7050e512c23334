use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    It,
    Es,
    De,
}

impl Locale {
    pub const ALL: [Locale; 5] = [Locale::En, Locale::Fr, Locale::It, Locale::Es, Locale::De];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::It => "it",
            Locale::Es => "es",
            Locale::De => "de",
        }
    }

    /// Language name as written into prompts.
    pub fn language_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Fr => "French",
            Locale::It => "Italian",
            Locale::Es => "Spanish",
            Locale::De => "German",
        }
    }

    pub fn native_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Fr => "Français",
            Locale::It => "Italiano",
            Locale::Es => "Español",
            Locale::De => "Deutsch",
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Locale::En => &EN,
            Locale::Fr => &FR,
            Locale::It => &IT,
            Locale::Es => &ES,
            Locale::De => &DE,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.native_name(), self.code())
    }
}

impl FromStr for Locale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Locale::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or(ValidationError::UnknownLocale(s.to_string()))
    }
}

/// Fixed display strings for one locale.
#[derive(Debug)]
pub struct Labels {
    pub presentation: &'static str,
    pub introduction: &'static str,
    pub player_characters: &'static str,
    pub briefings: &'static str,
    pub steps: &'static str,
    pub info_cards: &'static str,
    pub clues: &'static str,
    pub computer_messages: &'static str,
    pub endings: &'static str,
    pub pitch: &'static str,
    pub description: &'static str,
    pub mutation: &'static str,
    pub secret_society: &'static str,
    pub society_objective: &'static str,
    pub personal_objective: &'static str,
    pub for_player: &'static str,
    pub step: &'static str,
    pub options: &'static str,
    pub consequence: &'static str,
    pub summary_table: &'static str,
    pub info_card: &'static str,
    pub clue: &'static str,
    pub condition: &'static str,
    pub images: &'static str,
    pub loading_ideas: &'static str,
    pub loading_scenario: &'static str,
    pub loading_images: &'static str,
    pub improving_text: &'static str,
    pub improve_failed: &'static str,
    pub choose_mission: &'static str,
    pub other_ideas: &'static str,
    pub choose_language: &'static str,
    pub choose_player_count: &'static str,
    pub players: &'static str,
    pub improve: &'static str,
    pub download: &'static str,
    pub new_scenario: &'static str,
    pub quit: &'static str,
    pub error_title: &'static str,
    pub restart: &'static str,
    pub theme_prompt: &'static str,
    pub api_key_missing: &'static str,
    pub api_key_prompt: &'static str,
    pub api_key_required: &'static str,
    pub interface_language: &'static str,
    pub save_settings: &'static str,
    pub settings_saved: &'static str,
}

static EN: Labels = Labels {
    presentation: "Presentation (GM only)",
    introduction: "Introduction",
    player_characters: "Player Characters",
    briefings: "Briefings",
    steps: "Scenario Steps",
    info_cards: "Info Cards",
    clues: "Clues",
    computer_messages: "Computer Messages",
    endings: "Alternative Endings",
    pitch: "Pitch",
    description: "Description",
    mutation: "Mutation",
    secret_society: "Secret Society",
    society_objective: "Objective (Society)",
    personal_objective: "Objective (Personal)",
    for_player: "For",
    step: "Step",
    options: "Options",
    consequence: "Consequence",
    summary_table: "Summary Table",
    info_card: "Card",
    clue: "Clue",
    condition: "Condition",
    images: "Images",
    loading_ideas: "The Computer is thinking about perilous missions",
    loading_scenario: "Analysing the mission briefing",
    loading_images: "Generating propaganda visuals",
    improving_text: "The Computer is improving this text",
    improve_failed: "Could not improve the text.",
    choose_mission: "[ CHOOSE YOUR MISSION, TROUBLESHOOTER ]",
    other_ideas: "Generate other ideas",
    choose_language: "[ SELECT THE MISSION LANGUAGE ]",
    choose_player_count: "SELECT THE NUMBER OF (EXPENDABLE) TROUBLESHOOTERS:",
    players: "players",
    improve: "Improve a section",
    download: "Download the scenario (.zip)",
    new_scenario: "Generate a new scenario",
    quit: "Quit",
    error_title: "[ TREASON ERROR DETECTED ]",
    restart: "Restart",
    theme_prompt: "Theme (optional):",
    api_key_missing: "No Gemini API key found in config.yml or these environment variables:",
    api_key_prompt: "Gemini API key:",
    api_key_required: "An API key is required",
    interface_language: "Select the interface language:",
    save_settings: "Save these settings to config.yml?",
    settings_saved: "Configuration saved.",
};

static FR: Labels = Labels {
    presentation: "Présentation (MJ uniquement)",
    introduction: "Introduction",
    player_characters: "Personnages Joueurs",
    briefings: "Briefings",
    steps: "Étapes du Scénario",
    info_cards: "Fiches",
    clues: "Indices",
    computer_messages: "Messages de l'Ordinateur",
    endings: "Fins Alternatives",
    pitch: "Pitch",
    description: "Description",
    mutation: "Mutation",
    secret_society: "Société Secrète",
    society_objective: "Objectif (Société)",
    personal_objective: "Objectif (Personnel)",
    for_player: "Pour",
    step: "Étape",
    options: "Options",
    consequence: "Conséquence",
    summary_table: "Tableau Récapitulatif",
    info_card: "Fiche",
    clue: "Indice",
    condition: "Condition",
    images: "Images",
    loading_ideas: "L'Ordinateur réfléchit à des missions périlleuses",
    loading_scenario: "Analyse du briefing de mission",
    loading_images: "Génération des visuels de propagande",
    improving_text: "L'Ordinateur améliore ce texte",
    improve_failed: "Impossible d'améliorer le texte.",
    choose_mission: "[ CHOISISSEZ VOTRE MISSION, CLARIFICATEUR ]",
    other_ideas: "Générer d'autres idées",
    choose_language: "[ CHOISISSEZ LA LANGUE DE LA MISSION ]",
    choose_player_count: "SÉLECTIONNEZ LE NOMBRE DE CLARIFICATEURS (JETABLES) :",
    players: "joueurs",
    improve: "Améliorer une section",
    download: "Télécharger le scénario (.zip)",
    new_scenario: "Générer un nouveau scénario",
    quit: "Quitter",
    error_title: "[ ERREUR DE TRAHISON DÉTECTÉE ]",
    restart: "Recommencer",
    theme_prompt: "Thème (facultatif) :",
    api_key_missing: "Aucune clé API Gemini dans config.yml ni dans ces variables d'environnement :",
    api_key_prompt: "Clé API Gemini :",
    api_key_required: "Une clé API est requise",
    interface_language: "Choisissez la langue de l'interface :",
    save_settings: "Enregistrer ces réglages dans config.yml ?",
    settings_saved: "Configuration enregistrée.",
};

static IT: Labels = Labels {
    presentation: "Presentazione (solo GM)",
    introduction: "Introduzione",
    player_characters: "Personaggi Giocanti",
    briefings: "Briefing",
    steps: "Fasi dello Scenario",
    info_cards: "Schede",
    clues: "Indizi",
    computer_messages: "Messaggi del Computer",
    endings: "Finali Alternativi",
    pitch: "Pitch",
    description: "Descrizione",
    mutation: "Mutazione",
    secret_society: "Società Segreta",
    society_objective: "Obiettivo (Società)",
    personal_objective: "Obiettivo (Personale)",
    for_player: "Per",
    step: "Fase",
    options: "Opzioni",
    consequence: "Conseguenza",
    summary_table: "Tabella Riassuntiva",
    info_card: "Scheda",
    clue: "Indizio",
    condition: "Condizione",
    images: "Immagini",
    loading_ideas: "Il Computer sta pensando a missioni pericolose",
    loading_scenario: "Analisi del briefing della missione",
    loading_images: "Generazione delle immagini di propaganda",
    improving_text: "Il Computer sta migliorando questo testo",
    improve_failed: "Impossibile migliorare il testo.",
    choose_mission: "[ SCEGLI LA TUA MISSIONE, RISOLUTORE ]",
    other_ideas: "Genera altre idee",
    choose_language: "[ SELEZIONA LA LINGUA DELLA MISSIONE ]",
    choose_player_count: "SELEZIONA IL NUMERO DI RISOLUTORI (SACRIFICABILI):",
    players: "giocatori",
    improve: "Migliora una sezione",
    download: "Scarica lo scenario (.zip)",
    new_scenario: "Genera un nuovo scenario",
    quit: "Esci",
    error_title: "[ ERRORE DI TRADIMENTO RILEVATO ]",
    restart: "Ricomincia",
    theme_prompt: "Tema (facoltativo):",
    api_key_missing: "Nessuna chiave API Gemini in config.yml o in queste variabili d'ambiente:",
    api_key_prompt: "Chiave API Gemini:",
    api_key_required: "È necessaria una chiave API",
    interface_language: "Scegli la lingua dell'interfaccia:",
    save_settings: "Salvare queste impostazioni in config.yml?",
    settings_saved: "Configurazione salvata.",
};

static ES: Labels = Labels {
    presentation: "Presentación (solo DJ)",
    introduction: "Introducción",
    player_characters: "Personajes Jugadores",
    briefings: "Informes",
    steps: "Etapas del Escenario",
    info_cards: "Fichas",
    clues: "Pistas",
    computer_messages: "Mensajes del Ordenador",
    endings: "Finales Alternativos",
    pitch: "Sinopsis",
    description: "Descripción",
    mutation: "Mutación",
    secret_society: "Sociedad Secreta",
    society_objective: "Objetivo (Sociedad)",
    personal_objective: "Objetivo (Personal)",
    for_player: "Para",
    step: "Etapa",
    options: "Opciones",
    consequence: "Consecuencia",
    summary_table: "Tabla Resumen",
    info_card: "Ficha",
    clue: "Pista",
    condition: "Condición",
    images: "Imágenes",
    loading_ideas: "El Ordenador está pensando en misiones peligrosas",
    loading_scenario: "Analizando el informe de la misión",
    loading_images: "Generando imágenes de propaganda",
    improving_text: "El Ordenador está mejorando este texto",
    improve_failed: "No se pudo mejorar el texto.",
    choose_mission: "[ ELIGE TU MISIÓN, SOLUCIONADOR ]",
    other_ideas: "Generar otras ideas",
    choose_language: "[ SELECCIONA EL IDIOMA DE LA MISIÓN ]",
    choose_player_count: "SELECCIONA EL NÚMERO DE SOLUCIONADORES (PRESCINDIBLES):",
    players: "jugadores",
    improve: "Mejorar una sección",
    download: "Descargar el escenario (.zip)",
    new_scenario: "Generar un nuevo escenario",
    quit: "Salir",
    error_title: "[ ERROR DE TRAICIÓN DETECTADO ]",
    restart: "Reiniciar",
    theme_prompt: "Tema (opcional):",
    api_key_missing: "No se encontró ninguna clave API de Gemini en config.yml ni en estas variables de entorno:",
    api_key_prompt: "Clave API de Gemini:",
    api_key_required: "Se necesita una clave API",
    interface_language: "Elige el idioma de la interfaz:",
    save_settings: "¿Guardar estos ajustes en config.yml?",
    settings_saved: "Configuración guardada.",
};

static DE: Labels = Labels {
    presentation: "Präsentation (nur SL)",
    introduction: "Einleitung",
    player_characters: "Spielercharaktere",
    briefings: "Briefings",
    steps: "Szenario-Schritte",
    info_cards: "Infokarten",
    clues: "Hinweise",
    computer_messages: "Nachrichten des Computers",
    endings: "Alternative Enden",
    pitch: "Pitch",
    description: "Beschreibung",
    mutation: "Mutation",
    secret_society: "Geheimgesellschaft",
    society_objective: "Ziel (Gesellschaft)",
    personal_objective: "Ziel (Persönlich)",
    for_player: "Für",
    step: "Schritt",
    options: "Optionen",
    consequence: "Konsequenz",
    summary_table: "Übersichtstabelle",
    info_card: "Karte",
    clue: "Hinweis",
    condition: "Bedingung",
    images: "Bilder",
    loading_ideas: "Der Computer denkt über gefährliche Missionen nach",
    loading_scenario: "Analyse des Missionsbriefings",
    loading_images: "Erzeuge Propagandabilder",
    improving_text: "Der Computer verbessert diesen Text",
    improve_failed: "Der Text konnte nicht verbessert werden.",
    choose_mission: "[ WÄHLE DEINE MISSION, TROUBLESHOOTER ]",
    other_ideas: "Andere Ideen generieren",
    choose_language: "[ WÄHLE DIE SPRACHE DER MISSION ]",
    choose_player_count: "WÄHLE DIE ANZAHL DER (ENTBEHRLICHEN) TROUBLESHOOTER:",
    players: "Spieler",
    improve: "Einen Abschnitt verbessern",
    download: "Szenario herunterladen (.zip)",
    new_scenario: "Neues Szenario generieren",
    quit: "Beenden",
    error_title: "[ VERRATSFEHLER ENTDECKT ]",
    restart: "Neu starten",
    theme_prompt: "Thema (optional):",
    api_key_missing: "Kein Gemini-API-Schlüssel in config.yml oder diesen Umgebungsvariablen gefunden:",
    api_key_prompt: "Gemini-API-Schlüssel:",
    api_key_required: "Ein API-Schlüssel ist erforderlich",
    interface_language: "Sprache der Oberfläche wählen:",
    save_settings: "Diese Einstellungen in config.yml speichern?",
    settings_saved: "Konfiguration gespeichert.",
};

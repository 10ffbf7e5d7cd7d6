use chrono::{DateTime, Datelike, Weekday};
use chrono_tz::Tz;

pub const KNOWN_JUDGES: &[&str] = &[
    "Carlomagno", "Di Iorio", "Farinella", "Fuccio", "Fuccio Sanza", "Cardinali", "Cirillo",
    "Puliafito", "Beccia", "Mannara", "De Santis", "Sodani", "Petrocelli", "Ferrante",
    "Filocamo", "Ferretti", "Sorrentino", "Barzellotti", "Palmaccio", "Vigorito", "Vitelli",
    "Nardone", "Ragusa", "Cerasoli", "Roda", "Ciabattari", "Lombardi", "Russo", "Maellaro",
    "Nappi", "Petti", "Coniglio", "Croci", "Bocola", "Ciampelli", "Arcieri", "Karpinska",
    "GDP", "GUP", "GIP", "GOT", "Collegio", "Collegio A", "Collegio B", "Collegio C",
    "Corte d'Appello",
];

pub const KNOWN_LAWYERS: &[&str] = &[
    "Burgada", "Candeloro", "Fortino", "Sciullo", "Puggioni", "Messina", "Bruni",
    "Martellino", "Di Giovanni", "Montaruli", "Panfilo", "Fazzari", "Gentili", "Patrizi",
    "Napolitano", "Archilei", "Lenzi", "Fucci", "Viola", "Ascone", "D'Orso", "Milita",
    "Vincenzi", "Caliendo",
];

pub const JUDGE_TYPOS: &[(&str, &str)] = &[
    ("Farinela", "Farinella"),
    ("Sodanoi", "Sodani"),
    ("Fuccuo", "Fuccio"),
    ("Petrucelli", "Petrocelli"),
    ("Di Ioro", "Di Iorio"),
    ("Puliafitto", "Puliafito"),
    ("Maelaro", "Maellaro"),
];

pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("predib", "predibattimentale"),
    ("disc", "discussione"),
    ("tpm", "tribunale per i minorenni"),
    ("gdp", "giudice di pace"),
    ("ndp", "non doversi procedere"),
];

fn weekday_it(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunedì",
        Weekday::Tue => "martedì",
        Weekday::Wed => "mercoledì",
        Weekday::Thu => "giovedì",
        Weekday::Fri => "venerdì",
        Weekday::Sat => "sabato",
        Weekday::Sun => "domenica",
    }
}

pub fn build_prompt(note: &str, today: DateTime<Tz>) -> String {
    render(&format!("APPUNTO DA ANALIZZARE:\n{note}"), today)
}

/// Same instructions, with the user's answer appended as a correction line.
pub fn build_correction_prompt(original: &str, correction: &str, today: DateTime<Tz>) -> String {
    render(
        &format!(
            "APPUNTO ORIGINALE:\n{original}\n\nCORREZIONE DELL'AVVOCATO (ha la precedenza sull'appunto):\n{correction}"
        ),
        today,
    )
}

fn render(note_block: &str, today: DateTime<Tz>) -> String {
    let date = today.format("%d/%m/%Y");
    let weekday = weekday_it(today.weekday());
    let year = today.year();
    let judges = KNOWN_JUDGES.join(", ");
    let lawyers = KNOWN_LAWYERS.join(", ");
    let typos = JUDGE_TYPOS
        .iter()
        .map(|(from, to)| format!("- \"{from}\" → \"{to}\""))
        .collect::<Vec<_>>()
        .join("\n");
    let abbreviations = ABBREVIATIONS
        .iter()
        .map(|(short, long)| format!("- \"{short}\" = {long}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Sei l'assistente di un avvocato penalista italiano che ti invia appunti rapidi presi in udienza. \
Interpreta ogni appunto in autonomia e rispondi SOLO con JSON valido.

OGGI: {date} ({weekday})
ANNO CORRENTE: {year}

TIPI DI APPUNTO
- rinvio: contiene una data futura (\"rinvio al\", \"udienza del\", \"h 10\", \"ore 10\"). Crea uno o più eventi.
- sentenza: \"condanna\", \"assolto\", \"530\", \"prescritto\", \"ndp\", \"131bis\", pene in mesi/anni/euro.
- riserva: \"riserva\", \"riservato\", \"riservata\".
- trattenuta: \"trattenuta\", \"trattenuto\".
- nota: informazione senza data futura né esito.

STRUTTURA TIPICA: [PARTE] [GIUDICE] [cosa è successo] [DATA] [ORA] [prossimi incombenti]
- La prima parola è quasi sempre la parte. Non correggere mai i cognomi delle parti.
- \"avv\" o \"avv.\" introduce un avvocato, mai il giudice.
- Una città (Roma, Grosseto, Taranto...) è il luogo, non il giudice.
- Se non riconosci alcun giudice usa \"Tribunale Civitavecchia\".

GIUDICI NOTI: {judges}
AVVOCATI NOTI (non sono giudici): {lawyers}

CORREZIONI AUTOMATICHE DEI GIUDICI:
{typos}

ABBREVIAZIONI:
{abbreviations}

DATE E ORE
- Formati: 15/3/26, 15/03/2026, 15.3.26, 15-3-26, 15 marzo 2026, \"al 15/3\".
- Errori di battitura: O→0, l/I→1, S→5, B→8, spazi dentro i numeri.
- Anno mancante: anno corrente, o il successivo se la data è già passata. \"26\" = 2026.
- Ore: \"h 10\", \"ore 10\", \"alle 10\", \"10.30\", \"10,30\" → HH:MM. Ora mancante → 09:00.
- Restituisci sempre data come DD/MM/YYYY e ora come HH:MM.

PIÙ EVENTI: separatori \"———\", \"——-\", \"----\" o più date diverse indicano eventi distinti.

CHIEDI CONFERMA SOLO SE: la data è nel passato con anno esplicito, la data è ambigua, \
l'appunto è incomprensibile, o non capisci se è un rinvio o una sentenza.

FORMATI DI RISPOSTA
Rinvio:
{{\"tipo\": \"rinvio\", \"eventi\": [{{\"parte\": \"...\", \"giudice\": \"...\", \"data\": \"DD/MM/YYYY\", \"ora\": \"HH:MM\", \"rg\": \"numero RG se presente\", \"note\": \"appunto integrale\"}}], \
\"correzioni\": [{{\"campo\": \"giudice\", \"da\": \"Farinela\", \"a\": \"Farinella\"}}]}}
Sentenza: {{\"tipo\": \"sentenza\"}}
Riserva: {{\"tipo\": \"riserva\"}}
Trattenuta: {{\"tipo\": \"trattenuta\"}}
Nota: {{\"tipo\": \"nota\"}}
Dubbio: {{\"tipo\": \"conferma\", \"dubbio\": \"...\", \"interpretazione\": {{\"parte\": \"...\", \"giudice\": \"...\", \"data\": \"...\", \"ora\": \"...\"}}, \"domanda\": \"Va bene così? (sì/no)\"}}
Data passata: {{\"tipo\": \"data_passata\", \"data_letta\": \"15/01/2024\", \"opzioni\": [{{\"id\": \"a\", \"data\": \"15/01/2025\"}}, {{\"id\": \"b\", \"data\": \"15/01/2026\"}}], \
\"interpretazione\": {{\"parte\": \"...\", \"giudice\": \"...\", \"ora\": \"...\"}}, \"domanda\": \"Intendevi a) o b)?\"}}

ESEMPI
- \"Rossi Sodani rinvio al 15/3/26 h 10 per esame testi\" → rinvio, parte Rossi, giudice Sodani, 15/03/2026 10:00
- \"Giuliano: di iorio, avv Lucia pepe, rinvio al 18/9/26 h 10\" → rinvio, giudice Di Iorio (Pepe è l'avvocato)
- \"De caro: beccia: 530 assolto fatto non sussiste\" → sentenza
- \"Vitale: riserva\" → riserva
- \"calicchio: gdp cerasoli: trattenuta\" → trattenuta
- \"Bianchi Farinela 15/3 h 9\" → rinvio, giudice Farinella, correzione Farinela→Farinella
- \"Kowalczyk 15/3/26 h 10 per discussione\" → rinvio, giudice Tribunale Civitavecchia
- \"Airi: grosseto, rinvio al 13/10/26 h 12.30\" → rinvio, giudice Grosseto

{note_block}

Rispondi SOLO con JSON valido, senza markdown e senza commenti."
    )
}

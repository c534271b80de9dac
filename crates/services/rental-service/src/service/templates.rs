//! Localized plain-text message copy (fr, en, nl).

struct ConfirmationCopy {
    subject: &'static str,
    title: &'static str,
    hello: &'static str,
    body: &'static str,
    car_label: &'static str,
    plate_label: &'static str,
    time_label: &'static str,
    footer: &'static str,
}

struct ReceivedCopy {
    subject: &'static str,
    title: &'static str,
    hello: &'static str,
    /// `{vehicle}` is replaced by the requested vehicle
    body_with_vehicle: &'static str,
    body_without_vehicle: &'static str,
    review: &'static str,
    next_steps: &'static str,
    footer: &'static str,
}

const CONFIRMATION_FR: ConfirmationCopy = ConfirmationCopy {
    subject: "Réservation Confirmée - BNT - LUXURY BONAT CARS",
    title: "RÉSERVATION CONFIRMÉE",
    hello: "Bonjour",
    body: "Nous sommes ravis de vous informer que votre réservation a été acceptée. Votre véhicule est prêt.",
    car_label: "Véhicule assigné",
    plate_label: "Immatriculation",
    time_label: "Heure de récupération",
    footer: "Ceci est un message automatique, merci de ne pas y répondre. BNT LUXURY BONAT CARS.",
};

const CONFIRMATION_EN: ConfirmationCopy = ConfirmationCopy {
    subject: "Booking Confirmed - BNT - LUXURY BONAT CARS",
    title: "BOOKING CONFIRMED",
    hello: "Hello",
    body: "We are pleased to inform you that your booking has been accepted. Your vehicle is ready.",
    car_label: "Assigned Vehicle",
    plate_label: "License Plate",
    time_label: "Pickup Time",
    footer: "This is an automated message, please do not reply. BNT LUXURY BONAT CARS.",
};

const CONFIRMATION_NL: ConfirmationCopy = ConfirmationCopy {
    subject: "Boeking Bevestigd - BNT - LUXURY BONAT CARS",
    title: "BOEKING BEVESTIGD",
    hello: "Hallo",
    body: "Het verheugt ons u te kunnen informeren dat uw boeking is geaccepteerd. Uw voertuig staat klaar.",
    car_label: "Toegewezen voertuig",
    plate_label: "Kenteken",
    time_label: "Ophaaltijd",
    footer: "Dit is een automatisch bericht, gelieve niet te beantwoorden. BNT LUXURY BONAT CARS.",
};

const RECEIVED_FR: ReceivedCopy = ReceivedCopy {
    subject: "Demande reçue - En cours de traitement - BNT LUXURY",
    title: "DEMANDE REÇUE",
    hello: "Bonjour",
    body_with_vehicle: "Nous avons bien reçu votre demande de réservation pour le véhicule {vehicle}.",
    body_without_vehicle: "Nous avons bien reçu vos documents de vérification.",
    review: "Notre équipe vérifie actuellement vos documents d'identité et la disponibilité finale du véhicule. Cette procédure prend généralement entre 10 et 30 minutes.",
    next_steps: "Si tout est en ordre, vous recevrez un second e-mail avec la confirmation définitive de votre réservation. Si des informations supplémentaires sont nécessaires, nous vous contacterons.",
    footer: "Ceci est un message automatique, merci de ne pas y répondre.",
};

const RECEIVED_EN: ReceivedCopy = ReceivedCopy {
    subject: "Request Received - Processing - BNT LUXURY",
    title: "REQUEST RECEIVED",
    hello: "Hello",
    body_with_vehicle: "We have successfully received your booking request for the {vehicle}.",
    body_without_vehicle: "We have successfully received your verification documents.",
    review: "Our team is currently verifying your identity documents and final vehicle availability. This process usually takes between 10 and 30 minutes.",
    next_steps: "If everything is in order, you will receive a second email with the final confirmation of your booking. If any additional information is required, we will contact you.",
    footer: "This is an automated message, please do not reply.",
};

const RECEIVED_NL: ReceivedCopy = ReceivedCopy {
    subject: "Aanvraag Ontvangen - In Behandeling - BNT LUXURY",
    title: "AANVRAAG ONTVANGEN",
    hello: "Hallo",
    body_with_vehicle: "Wij hebben uw boekingsaanvraag voor de {vehicle} in goede orde ontvangen.",
    body_without_vehicle: "Wij hebben uw verificatiedocumenten in goede orde ontvangen.",
    review: "Ons team controleert momenteel uw identiteitsdocumenten en de definitieve beschikbaarheid van het voertuig. Dit proces duurt doorgaans 10 tot 30 minuten.",
    next_steps: "Als alles in orde is, ontvangt u een tweede e-mail met de definitieve bevestiging van uw boeking. Mochten wij aanvullende informatie nodig hebben, dan nemen wij contact met u op.",
    footer: "Dit is een automatisch bericht, gelieve niet te beantwoorden.",
};

/// Subject and body of a rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub text: String,
}

fn confirmation_copy(locale: &str) -> &'static ConfirmationCopy {
    match locale {
        "en" => &CONFIRMATION_EN,
        "nl" => &CONFIRMATION_NL,
        _ => &CONFIRMATION_FR,
    }
}

fn received_copy(locale: &str) -> &'static ReceivedCopy {
    match locale {
        "en" => &RECEIVED_EN,
        "nl" => &RECEIVED_NL,
        _ => &RECEIVED_FR,
    }
}

pub fn booking_confirmed(
    locale: &str,
    customer_name: &str,
    vehicle: &str,
    plate: &str,
    pickup_time: &str,
) -> Rendered {
    let t = confirmation_copy(locale);
    Rendered {
        subject: t.subject.to_string(),
        text: format!(
            "{}\n\n{} {},\n\n{}\n\n{}: {}\n{}: {}\n{}: {}\n\n{}",
            t.title,
            t.hello,
            customer_name,
            t.body,
            t.car_label,
            vehicle,
            t.plate_label,
            plate,
            t.time_label,
            pickup_time,
            t.footer
        ),
    }
}

pub fn submission_received(locale: &str, customer_name: &str, vehicle: Option<&str>) -> Rendered {
    let t = received_copy(locale);
    let opening = match vehicle {
        Some(v) => t.body_with_vehicle.replace("{vehicle}", v),
        None => t.body_without_vehicle.to_string(),
    };
    Rendered {
        subject: t.subject.to_string(),
        text: format!(
            "{}\n\n{} {},\n\n{}\n\n{}\n\n{}\n\n{}",
            t.title, t.hello, customer_name, opening, t.review, t.next_steps, t.footer
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_lists_vehicle_plate_and_time() {
        let m = booking_confirmed("en", "Amina", "Dacia Duster", "12345-A-6", "02/08/2025 10:30");
        assert_eq!(m.subject, "Booking Confirmed - BNT - LUXURY BONAT CARS");
        assert!(m.text.contains("Hello Amina,"));
        assert!(m.text.contains("Assigned Vehicle: Dacia Duster"));
        assert!(m.text.contains("License Plate: 12345-A-6"));
        assert!(m.text.contains("Pickup Time: 02/08/2025 10:30"));
    }

    #[test]
    fn test_unknown_locale_uses_french() {
        let m = submission_received("es", "Amina", None);
        assert!(m.subject.starts_with("Demande reçue"));
        assert!(m.text.contains("Bonjour Amina,"));
    }

    #[test]
    fn test_received_mentions_requested_vehicle() {
        let m = submission_received("nl", "Joost", Some("Range Rover Evoque"));
        assert!(m.text.contains("voor de Range Rover Evoque in goede orde"));
    }
}
